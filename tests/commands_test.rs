//! Command layer tests: the shapes handed back to callers.

mod common;

use common::{shop_db, FakeConnector};
use pgassist_lib::commands::{self, AppState};
use pgassist_lib::config::Settings;
use pgassist_lib::db::sql_generator::QueryInput;

// ─── helpers ───────────────────────────────────────────────────────────────

fn state() -> AppState<FakeConnector> {
    AppState::with_connector(Settings::default(), FakeConnector::new(shop_db()))
}

// ═══════════════════════════════════════════════════════════════════════════
//  SCHEMA COMMANDS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn analyze_schema_returns_report_json() {
    let state = state();
    let report = commands::schema::analyze_schema("", "users", &state)
        .await
        .expect("analyze_schema");

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["table_name"], "users");
    assert_eq!(json["columns"][0]["type"], "integer");
    assert_eq!(json["columns"][0]["is_primary"], true);
    assert_eq!(json["primary_key"], serde_json::json!(["id"]));
    assert!(json["create_table_sql"]
        .as_str()
        .unwrap()
        .starts_with("CREATE TABLE users ("));
}

#[tokio::test]
async fn analyze_schema_error_is_plain_message() {
    let state = state();
    let err = commands::schema::analyze_schema("", "nope", &state)
        .await
        .unwrap_err();
    assert_eq!(err, "Table 'nope' not found in the database.");
}

#[tokio::test]
async fn get_tables_lists_user_tables() {
    let state = state();
    let tables = commands::schema::get_tables("", &state).await.unwrap();
    assert_eq!(tables.len(), 3);
    assert_eq!(tables[2].schema, "sales");
    assert_eq!(tables[2].full_name, "sales.invoices");
}

#[tokio::test]
async fn test_connection_serializes_flat() {
    let state = state();
    let report = commands::schema::test_connection("", &state).await;
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["database"], "shop");
    assert!(json.get("error").is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
//  QUERY COMMANDS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn generate_query_select_with_join() {
    let input = QueryInput {
        table_name: "orders".to_string(),
        columns: "orders.id, customers.name".to_string(),
        join_table: "customers".to_string(),
        join_condition: "orders.customer_id = customers.id".to_string(),
        limit: "10".to_string(),
        ..Default::default()
    };
    let sql = commands::query::generate_query("select", &input);
    assert!(sql.starts_with("SELECT orders.id, customers.name\nFROM orders"));
    assert!(sql.contains("JOIN customers ON orders.customer_id = customers.id"));
    assert!(sql.ends_with("LIMIT 10;"));
}

#[test]
fn generate_query_errors_render_as_comments() {
    let sql = commands::query::generate_query("merge", &QueryInput::for_table("t"));
    assert_eq!(sql, "-- Error: Unsupported query type: merge");

    let sql = commands::query::generate_query("select", &QueryInput::default());
    assert_eq!(sql, "-- Error: Table name is required");
}

#[test]
fn template_reference_is_complete() {
    let kinds: Vec<&str> = commands::query::get_query_templates()
        .iter()
        .map(|t| t.kind.as_str())
        .collect();
    assert_eq!(kinds, vec!["select", "insert", "update", "delete", "create_table"]);
    assert!(!commands::query::get_join_examples().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR COMMANDS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn analyze_error_offline() {
    let state = state();
    let analysis = commands::errors::analyze_error(
        "ERROR: 23503 insert or update on table \"orders\" violates foreign key constraint",
        true,
        &state,
    )
    .await;

    assert_eq!(analysis.error_type, "Foreign Key Violation");
    assert_eq!(analysis.error_code.as_deref(), Some("23503"));
    assert!(!analysis.explanation.contains("Error Code Details"));

    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["error_code"], "23503");
}

#[test]
fn common_errors_reference() {
    let errors = commands::errors::get_common_errors();
    assert_eq!(errors.len(), 9);
    assert!(errors.iter().all(|e| !e.solution.is_empty()));
}
