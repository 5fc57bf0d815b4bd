use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

const CREATE_TABLE_TEMPLATE: &str = "CREATE TABLE {table_name} (
    id SERIAL PRIMARY KEY,
    {columns}
);";

const SELECT_TEMPLATE: &str = "SELECT {columns}
FROM {table_name}
{join_clause}
{where_clause}
{group_by_clause}
{order_by_clause}
{limit_clause};";

const INSERT_TEMPLATE: &str = "INSERT INTO {table_name} ({columns})
VALUES ({values})
{returning_clause};";

const UPDATE_TEMPLATE: &str = "UPDATE {table_name}
SET {set_clause}
{where_clause}
{returning_clause};";

const DELETE_TEMPLATE: &str = "DELETE FROM {table_name}
{where_clause}
{returning_clause};";

const DELETE_GUARD: &str = "WHERE 1=0 -- WARNING: Add a WHERE clause to prevent deleting all rows";

const RETURNING_ID: &str = "RETURNING id";

/// Statement kinds the template engine knows how to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
}

impl QueryKind {
    pub const ALL: [QueryKind; 5] = [
        QueryKind::Select,
        QueryKind::Insert,
        QueryKind::Update,
        QueryKind::Delete,
        QueryKind::CreateTable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Select => "select",
            QueryKind::Insert => "insert",
            QueryKind::Update => "update",
            QueryKind::Delete => "delete",
            QueryKind::CreateTable => "create_table",
        }
    }

    /// Raw template text with `{placeholder}` slots.
    pub fn template(&self) -> &'static str {
        match self {
            QueryKind::Select => SELECT_TEMPLATE,
            QueryKind::Insert => INSERT_TEMPLATE,
            QueryKind::Update => UPDATE_TEMPLATE,
            QueryKind::Delete => DELETE_TEMPLATE,
            QueryKind::CreateTable => CREATE_TABLE_TEMPLATE,
        }
    }
}

impl FromStr for QueryKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| QueryError::UnsupportedKind(s.to_string()))
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form-style input to the template engine. Every field is free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryInput {
    pub table_name: String,
    pub columns: String,
    pub conditions: String,
    pub join_table: String,
    pub join_condition: String,
    pub order_by: String,
    pub group_by: String,
    pub limit: String,
}

impl QueryInput {
    pub fn for_table(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            ..Self::default()
        }
    }
}

/// Generate SQL for a query kind given by name.
///
/// Failures come back as a single `-- Error: ...` SQL comment line.
pub fn generate_query(query_type: &str, input: &QueryInput) -> String {
    log::debug!(
        "Generating {} query for table {}",
        query_type,
        input.table_name
    );

    if is_blank(&input.table_name) {
        return QueryError::MissingTable.as_sql_comment();
    }

    let result = query_type
        .parse::<QueryKind>()
        .and_then(|kind| render(kind, input));

    match result {
        Ok(sql) => sql,
        Err(e) => {
            log::debug!("Query generation rejected: {}", e);
            e.as_sql_comment()
        }
    }
}

/// Fill the template for one query kind.
pub fn render(kind: QueryKind, input: &QueryInput) -> Result<String, QueryError> {
    if is_blank(&input.table_name) {
        return Err(QueryError::MissingTable);
    }
    match kind {
        QueryKind::CreateTable => Ok(generate_create_table(input)),
        QueryKind::Select => Ok(generate_select(input)),
        QueryKind::Insert => generate_insert(input),
        QueryKind::Update => generate_update(input),
        QueryKind::Delete => Ok(generate_delete(input)),
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// `prefix value` when value is present, otherwise an empty line.
fn clause(prefix: &str, value: &str) -> String {
    if is_blank(value) {
        String::new()
    } else {
        format!("{} {}", prefix, value)
    }
}

fn split_columns(columns: &str) -> Vec<&str> {
    columns.split(',').map(str::trim).collect()
}

/// Generate a CREATE TABLE skeleton.
fn generate_create_table(input: &QueryInput) -> String {
    let columns = if is_blank(&input.columns) {
        "column_name data_type"
    } else {
        input.columns.as_str()
    };
    fill(
        CREATE_TABLE_TEMPLATE,
        &[("table_name", input.table_name.as_str()), ("columns", columns)],
    )
}

/// Generate a SELECT statement.
fn generate_select(input: &QueryInput) -> String {
    let columns = if is_blank(&input.columns) {
        "*"
    } else {
        input.columns.as_str()
    };
    let join_clause = if is_blank(&input.join_table) || is_blank(&input.join_condition) {
        String::new()
    } else {
        format!("JOIN {} ON {}", input.join_table, input.join_condition)
    };

    fill(
        SELECT_TEMPLATE,
        &[
            ("columns", columns),
            ("table_name", input.table_name.as_str()),
            ("join_clause", join_clause.as_str()),
            ("where_clause", clause("WHERE", &input.conditions).as_str()),
            ("group_by_clause", clause("GROUP BY", &input.group_by).as_str()),
            ("order_by_clause", clause("ORDER BY", &input.order_by).as_str()),
            ("limit_clause", clause("LIMIT", &input.limit).as_str()),
        ],
    )
}

/// Generate an INSERT statement with one positional parameter per column.
fn generate_insert(input: &QueryInput) -> Result<String, QueryError> {
    if is_blank(&input.columns) {
        return Err(QueryError::MissingInsertColumns);
    }
    let values = (1..=split_columns(&input.columns).len())
        .map(|n| format!("${}", n))
        .collect::<Vec<_>>()
        .join(", ");
    let returning = if input.columns.contains("id") {
        RETURNING_ID
    } else {
        ""
    };

    Ok(fill(
        INSERT_TEMPLATE,
        &[
            ("table_name", input.table_name.as_str()),
            ("columns", input.columns.as_str()),
            ("values", values.as_str()),
            ("returning_clause", returning),
        ],
    ))
}

/// Generate an UPDATE statement. A bare column list becomes `col = $n` pairs.
fn generate_update(input: &QueryInput) -> Result<String, QueryError> {
    if is_blank(&input.columns) {
        return Err(QueryError::MissingSetClause);
    }
    let set_clause = if input.columns.contains('=') {
        input.columns.clone()
    } else {
        split_columns(&input.columns)
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{} = ${}", col, i + 1))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let returning = if is_blank(&input.conditions) {
        ""
    } else {
        RETURNING_ID
    };

    Ok(fill(
        UPDATE_TEMPLATE,
        &[
            ("table_name", input.table_name.as_str()),
            ("set_clause", set_clause.as_str()),
            ("where_clause", clause("WHERE", &input.conditions).as_str()),
            ("returning_clause", returning),
        ],
    ))
}

/// Generate a DELETE statement; never emits an unconditioned delete.
fn generate_delete(input: &QueryInput) -> String {
    let (where_clause, returning) = if is_blank(&input.conditions) {
        (DELETE_GUARD.to_string(), "")
    } else {
        (format!("WHERE {}", input.conditions), RETURNING_ID)
    };

    fill(
        DELETE_TEMPLATE,
        &[
            ("table_name", input.table_name.as_str()),
            ("where_clause", where_clause.as_str()),
            ("returning_clause", returning),
        ],
    )
}

/// Replace `{key}` slots in one left-to-right pass. Substituted text is not
/// rescanned; unknown slots are left as written.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let slot = after
            .find('}')
            .and_then(|close| {
                let key = &after[..close];
                values
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| (close, *v))
            });
        match slot {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
