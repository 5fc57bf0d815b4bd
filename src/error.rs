use thiserror::Error;

/// Failures surfaced by schema analysis and the table lister.
///
/// The `Display` text of each variant is the exact message handed back to
/// callers as `{"error": "..."}`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Error creating database connection: {0}")]
    Connection(String),

    #[error("Unsupported database type. Only PostgreSQL is supported.")]
    UnsupportedScheme(String),

    #[error("Invalid connection format. Use \"host:port/database\" or a full connection URL.")]
    InvalidDescriptor(String),

    #[error("Table '{0}' not found in the database.")]
    TableNotFound(String),

    #[error("Error analyzing schema: {0}")]
    Introspection(String),
}

impl SchemaError {
    /// Render an anyhow chain (`{:#}`) into a connection error.
    pub fn connection(err: &anyhow::Error) -> Self {
        SchemaError::Connection(format!("{:#}", err))
    }

    pub fn introspection(err: &anyhow::Error) -> Self {
        SchemaError::Introspection(format!("{:#}", err))
    }
}

/// Input problems reported by the query template engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("Table name is required")]
    MissingTable,

    #[error("Unsupported query type: {0}")]
    UnsupportedKind(String),

    #[error("Column names are required for INSERT statement")]
    MissingInsertColumns,

    #[error("SET clause is required for UPDATE statement")]
    MissingSetClause,
}

impl QueryError {
    /// The SQL-comment form rendered in place of a statement.
    pub fn as_sql_comment(&self) -> String {
        format!("-- Error: {}", self)
    }
}
