use super::AppState;
use crate::db::connectors::CatalogConnector;
use crate::db::introspector::ConnectionReport;
use crate::db::schema::{TableReport, TableSummary};

/// Analyze one table: columns, keys, indexes, constraints and reconstructed DDL.
pub async fn analyze_schema<C: CatalogConnector>(
    descriptor: &str,
    table_name: &str,
    state: &AppState<C>,
) -> Result<TableReport, String> {
    state
        .analyzer
        .analyze(descriptor, table_name)
        .await
        .map_err(|e| e.to_string())
}

/// Return every user table with its column count and primary key.
pub async fn get_tables<C: CatalogConnector>(
    descriptor: &str,
    state: &AppState<C>,
) -> Result<Vec<TableSummary>, String> {
    Ok(state.analyzer.list_tables(descriptor).await)
}

/// Check connectivity and report basic server facts.
pub async fn test_connection<C: CatalogConnector>(
    descriptor: &str,
    state: &AppState<C>,
) -> ConnectionReport {
    state.analyzer.test_connection(descriptor).await
}
