pub mod descriptor;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use super::ddl::ReflectedTable;
use super::schema::{ColumnDescriptor, ConstraintRow, ForeignKey, IndexDescriptor, ServerInfo};
use super::TableRef;
use crate::config::ConnectionDefaults;

pub use descriptor::resolve_descriptor;

/// Fully resolved connection parameters
#[derive(Clone, PartialEq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub connect_timeout_secs: u64,
}

impl ConnectionParams {
    pub fn from_defaults(defaults: &ConnectionDefaults) -> Self {
        Self {
            host: defaults.host.clone(),
            port: defaults.port,
            user: defaults.user.clone(),
            password: defaults.password.clone(),
            database: defaults.database.clone(),
            connect_timeout_secs: 30,
        }
    }
}

// Passwords stay out of logs.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Catalog introspection over one live connection.
///
/// Every method runs against the same connection; callers must `close` it
/// once they are done, on success and failure alike.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Liveness check (`SELECT 1`)
    async fn ping(&self) -> anyhow::Result<()>;

    /// All schema names known to the catalog, system schemas included
    async fn list_schemas(&self) -> anyhow::Result<Vec<String>>;

    /// Ordinary and partitioned tables in a schema
    async fn list_tables(&self, schema: &str) -> anyhow::Result<Vec<String>>;

    /// Columns in ordinal order, `is_primary` left false
    async fn get_columns(&self, table: &TableRef) -> anyhow::Result<Vec<ColumnDescriptor>>;

    /// Primary key columns in key order; empty when the table has none
    async fn get_primary_key(&self, table: &TableRef) -> anyhow::Result<Vec<String>>;

    async fn get_foreign_keys(&self, table: &TableRef) -> anyhow::Result<Vec<ForeignKey>>;

    async fn get_indexes(&self, table: &TableRef) -> anyhow::Result<Vec<IndexDescriptor>>;

    /// One row per (constraint, column) pair
    async fn get_constraints(&self, table: &TableRef) -> anyhow::Result<Vec<ConstraintRow>>;

    /// Server-rendered table structure, or `None` when reflection does not
    /// cover the table
    async fn reflect_table(&self, table: &TableRef) -> anyhow::Result<Option<ReflectedTable>>;

    async fn server_info(&self) -> anyhow::Result<ServerInfo>;

    /// Release the connection
    async fn close(&mut self) -> anyhow::Result<()>;
}

/// Opens catalog connections
#[async_trait]
pub trait CatalogConnector: Send + Sync {
    async fn connect(&self, params: &ConnectionParams) -> anyhow::Result<Box<dyn Catalog>>;
}
