use serde::Serialize;

use super::connectors::{resolve_descriptor, Catalog, CatalogConnector};
use super::ddl::{select_strategy, CreateTableStrategy, ManualDdl};
use super::sample::sample_data_structure;
use super::schema::{ServerInfo, TableReport, TableSummary};
use super::{is_system_schema, TableName, TableRef, PUBLIC_SCHEMA};
use crate::config::ConnectionDefaults;
use crate::error::SchemaError;

/// Outcome of a connection test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionReport {
    pub success: bool,
    #[serde(flatten)]
    pub info: Option<ServerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionReport {
    fn ok(info: ServerInfo) -> Self {
        Self {
            success: true,
            info: Some(info),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            info: None,
            error: Some(error),
        }
    }
}

/// Live-database schema analysis.
///
/// Every public call opens its own catalog connection, runs its queries one
/// after another and closes the connection before returning.
pub struct SchemaAnalyzer<C> {
    connector: C,
    defaults: ConnectionDefaults,
}

impl<C: CatalogConnector> SchemaAnalyzer<C> {
    pub fn new(connector: C, defaults: ConnectionDefaults) -> Self {
        Self {
            connector,
            defaults,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Analyze one table and reconstruct its `CREATE TABLE` statement.
    pub async fn analyze(
        &self,
        descriptor: &str,
        table_name: &str,
    ) -> Result<TableReport, SchemaError> {
        log::debug!("Analyzing table '{}'", table_name);
        let catalog = self.open(descriptor).await?;
        let result = build_report(catalog.as_ref(), table_name.trim()).await;
        release(catalog).await;

        if let Err(e) = &result {
            log::error!("Schema analysis of '{}' failed: {}", table_name, e);
        }
        result
    }

    /// Every table outside the system schemas. Degrades to an empty list.
    pub async fn list_tables(&self, descriptor: &str) -> Vec<TableSummary> {
        let catalog = match self.open(descriptor).await {
            Ok(catalog) => catalog,
            Err(e) => {
                log::error!("Error getting table info: {}", e);
                return Vec::new();
            }
        };
        let result = collect_summaries(catalog.as_ref()).await;
        release(catalog).await;

        result.unwrap_or_else(|e| {
            log::error!("Error getting table info: {:#}", e);
            Vec::new()
        })
    }

    /// Connect, then report server version, database size and table count.
    pub async fn test_connection(&self, descriptor: &str) -> ConnectionReport {
        let catalog = match self.open(descriptor).await {
            Ok(catalog) => catalog,
            Err(e) => return ConnectionReport::failed(e.to_string()),
        };
        let result = catalog.server_info().await;
        release(catalog).await;

        match result {
            Ok(info) => ConnectionReport::ok(info),
            Err(e) => {
                log::error!("Connection test failed: {:#}", e);
                ConnectionReport::failed(format!("{:#}", e))
            }
        }
    }

    async fn open(&self, descriptor: &str) -> Result<Box<dyn Catalog>, SchemaError> {
        let params = resolve_descriptor(descriptor, &self.defaults)?;
        log::debug!("Opening catalog connection with {:?}", params);

        let catalog = self
            .connector
            .connect(&params)
            .await
            .map_err(|e| SchemaError::connection(&e))?;

        if let Err(e) = catalog.ping().await {
            release(catalog).await;
            return Err(SchemaError::connection(&e));
        }
        Ok(catalog)
    }
}

async fn release(mut catalog: Box<dyn Catalog>) {
    if let Err(e) = catalog.close().await {
        log::warn!("Failed to close catalog connection: {:#}", e);
    }
}

/// Find the schema a requested table lives in.
async fn resolve_table(
    catalog: &dyn Catalog,
    requested: &TableName,
) -> anyhow::Result<Option<TableRef>> {
    let contains = |tables: Vec<String>| tables.iter().any(|t| *t == requested.name);

    if let Some(schema) = &requested.schema {
        let found = contains(catalog.list_tables(schema).await?);
        return Ok(found.then(|| TableRef::new(schema, &requested.name)));
    }

    if contains(catalog.list_tables(PUBLIC_SCHEMA).await?) {
        return Ok(Some(TableRef::new(PUBLIC_SCHEMA, &requested.name)));
    }

    for schema in catalog.list_schemas().await? {
        if schema == PUBLIC_SCHEMA || is_system_schema(&schema) {
            continue;
        }
        if contains(catalog.list_tables(&schema).await?) {
            return Ok(Some(TableRef::new(&schema, &requested.name)));
        }
    }
    Ok(None)
}

async fn build_report(catalog: &dyn Catalog, table_name: &str) -> Result<TableReport, SchemaError> {
    let requested = TableName::parse(table_name);
    let table = resolve_table(catalog, &requested)
        .await
        .map_err(|e| SchemaError::introspection(&e))?
        .ok_or_else(|| SchemaError::TableNotFound(table_name.to_string()))?;

    let mut columns = catalog
        .get_columns(&table)
        .await
        .map_err(|e| SchemaError::introspection(&e))?;
    let primary_key = catalog
        .get_primary_key(&table)
        .await
        .map_err(|e| SchemaError::introspection(&e))?;
    let foreign_keys = catalog
        .get_foreign_keys(&table)
        .await
        .map_err(|e| SchemaError::introspection(&e))?;

    let indexes = catalog.get_indexes(&table).await.unwrap_or_else(|e| {
        log::warn!("Error getting indexes for {}: {:#}", table, e);
        Vec::new()
    });
    let constraints = catalog.get_constraints(&table).await.unwrap_or_else(|e| {
        log::warn!("Error getting constraints for {}: {:#}", table, e);
        Vec::new()
    });

    for column in &mut columns {
        column.is_primary = primary_key.contains(&column.name);
    }

    let display_name = table.display_name();
    let reflection = catalog.reflect_table(&table).await;
    let strategy = select_strategy(
        reflection,
        ManualDdl {
            table_name: &display_name,
            columns: &columns,
            primary_key: &primary_key,
            foreign_keys: &foreign_keys,
            constraints: &constraints,
        },
    );
    log::debug!("Rendering CREATE TABLE for {} ({})", table, strategy.name());
    let create_table_sql = strategy.render();
    drop(strategy);

    let sample_data_structure = sample_data_structure(&columns);

    Ok(TableReport {
        table_name: table_name.to_string(),
        columns,
        primary_key,
        foreign_keys,
        indexes,
        constraints,
        create_table_sql,
        sample_data_structure,
    })
}

async fn collect_summaries(catalog: &dyn Catalog) -> anyhow::Result<Vec<TableSummary>> {
    let mut summaries = Vec::new();
    for schema in catalog.list_schemas().await? {
        if is_system_schema(&schema) {
            continue;
        }
        for name in catalog.list_tables(&schema).await? {
            let table = TableRef::new(&schema, &name);
            let column_count = catalog.get_columns(&table).await?.len();
            let primary_key = catalog.get_primary_key(&table).await?;
            summaries.push(TableSummary::new(&schema, &name, column_count, primary_key));
        }
    }
    Ok(summaries)
}
