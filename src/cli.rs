use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::commands::{self, AppState};
use crate::db::sql_generator::QueryInput;

#[derive(Parser)]
#[command(name = "pgassist", version, about = "PostgreSQL developer assistant")]
pub struct Cli {
    #[arg(long, short = 'c', help = "path to config file", global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Classify a PostgreSQL error message
    Classify {
        error_text: String,
        /// Skip the error-code documentation lookup
        #[arg(long)]
        offline: bool,
    },
    /// Generate a SQL statement from a template
    Generate(GenerateArgs),
    /// Analyze a table and reconstruct its CREATE TABLE statement
    Analyze {
        #[arg(long, short = 't')]
        table: String,
        #[arg(long, default_value = "")]
        connection: String,
    },
    /// List user tables
    Tables {
        #[arg(long, default_value = "")]
        connection: String,
    },
    /// Check that a database is reachable
    TestConnection {
        #[arg(long, default_value = "")]
        connection: String,
    },
    /// Print the query template reference
    Templates,
    /// Print the common error reference
    CommonErrors,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// select, insert, update, delete or create_table
    pub kind: String,
    #[arg(long, short = 't', default_value = "")]
    pub table: String,
    #[arg(long, default_value = "")]
    pub columns: String,
    #[arg(long, default_value = "")]
    pub conditions: String,
    #[arg(long, default_value = "")]
    pub join_table: String,
    #[arg(long, default_value = "")]
    pub join_condition: String,
    #[arg(long, default_value = "")]
    pub order_by: String,
    #[arg(long, default_value = "")]
    pub group_by: String,
    #[arg(long, default_value = "")]
    pub limit: String,
}

impl From<GenerateArgs> for QueryInput {
    fn from(args: GenerateArgs) -> Self {
        QueryInput {
            table_name: args.table,
            columns: args.columns,
            conditions: args.conditions,
            join_table: args.join_table,
            join_condition: args.join_condition,
            order_by: args.order_by,
            group_by: args.group_by,
            limit: args.limit,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

/// Run one command and return what should be printed on stdout.
pub async fn execute(command: Cmd, state: &AppState) -> Result<String, String> {
    match command {
        Cmd::Classify {
            error_text,
            offline,
        } => to_json(&commands::errors::analyze_error(&error_text, offline, state).await),
        Cmd::Generate(args) => {
            let kind = args.kind.clone();
            Ok(commands::query::generate_query(&kind, &args.into()))
        }
        Cmd::Analyze { table, connection } => {
            let report = commands::schema::analyze_schema(&connection, &table, state).await?;
            to_json(&report)
        }
        Cmd::Tables { connection } => {
            to_json(&commands::schema::get_tables(&connection, state).await?)
        }
        Cmd::TestConnection { connection } => {
            to_json(&commands::schema::test_connection(&connection, state).await)
        }
        Cmd::Templates => to_json(&serde_json::json!({
            "templates": commands::query::get_query_templates(),
            "joins": commands::query::get_join_examples(),
        })),
        Cmd::CommonErrors => to_json(&commands::errors::get_common_errors()),
    }
}

/// Print a command result; failures go out as `{"error": ...}` with exit code 1.
pub fn report(result: Result<String, String>) {
    match result {
        Ok(out) => println!("{}", out),
        Err(e) => {
            let body = to_json(&ErrorBody { error: &e })
                .unwrap_or_else(|_| format!("{{\"error\": {:?}}}", e));
            println!("{}", body);
            std::process::exit(1);
        }
    }
}
