pub mod connectors;
pub mod ddl;
pub mod introspector;
pub mod sample;
pub mod schema;
pub mod sql_generator;
pub mod templates;

use std::fmt;

/// Schema searched first for unqualified table names.
pub const PUBLIC_SCHEMA: &str = "public";

/// Schemas owned by the server itself; never searched or listed.
pub fn is_system_schema(schema: &str) -> bool {
    schema == "pg_catalog"
        || schema == "information_schema"
        || schema.starts_with("pg_toast")
        || schema.starts_with("pg_temp_")
}

/// A table name as typed by the caller: `schema.table` or bare `table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once('.') {
            Some((schema, name)) if !schema.is_empty() && !name.is_empty() => Self {
                schema: Some(schema.to_string()),
                name: name.to_string(),
            },
            _ => Self {
                schema: None,
                name: raw.to_string(),
            },
        }
    }
}

/// A table whose schema has been resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }

    /// Bare name inside `public`, qualified elsewhere.
    pub fn display_name(&self) -> String {
        if self.schema == PUBLIC_SCHEMA {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}
