use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Full analysis of a single table
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<IndexDescriptor>,
    pub constraints: Vec<ConstraintRow>,
    pub create_table_sql: String,
    pub sample_data_structure: String,
}

/// Represents a column in a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub is_primary: bool,
}

impl ColumnDescriptor {
    pub fn new(name: &str, data_type: &str, nullable: bool, default: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable,
            default: default.map(|d| d.to_string()),
            is_primary: false,
        }
    }
}

/// A foreign key constraint; `columns[i]` references `referred_columns[i]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referred_table: String,
    pub referred_columns: Vec<String>,
}

/// Represents an index on a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

/// One column's participation in a named constraint.
///
/// Multi-column constraints come back from the catalog as several rows
/// sharing the same `name`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintRow {
    pub name: String,
    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,
    pub column: String,
    pub deferrable: bool,
    pub deferred: bool,
    pub definition: Option<String>,
}

impl ConstraintRow {
    /// Build a row from raw catalog fields, rejecting rows without a name,
    /// column or type code.
    pub fn from_catalog(
        name: Option<String>,
        type_code: Option<String>,
        column: Option<String>,
        deferrable: Option<bool>,
        deferred: Option<bool>,
        definition: Option<String>,
    ) -> Option<Self> {
        let name = name.filter(|n| !n.is_empty())?;
        let column = column.filter(|c| !c.is_empty())?;
        let constraint_type = ConstraintType::from_code(&type_code?);
        let definition = definition
            .map(|d| strip_type_keyword(&constraint_type, &d))
            .filter(|d| !d.is_empty());

        Some(Self {
            name,
            constraint_type,
            column,
            deferrable: deferrable.unwrap_or(false),
            deferred: deferred.unwrap_or(false),
            definition,
        })
    }
}

/// `pg_get_constraintdef` repeats the constraint keyword; keep only the body.
fn strip_type_keyword(constraint_type: &ConstraintType, definition: &str) -> String {
    let keyword = match constraint_type {
        ConstraintType::Check => "CHECK",
        ConstraintType::Unique => "UNIQUE",
        ConstraintType::Exclusion => "EXCLUDE",
        ConstraintType::PrimaryKey => "PRIMARY KEY",
        ConstraintType::ForeignKey => "FOREIGN KEY",
        _ => return definition.trim().to_string(),
    };
    let trimmed = definition.trim();
    match trimmed.get(..keyword.len()) {
        Some(head) if head.eq_ignore_ascii_case(keyword) => trimmed[keyword.len()..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// Type of table constraint, decoded from `pg_constraint.contype`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    Check,
    ForeignKey,
    PrimaryKey,
    Unique,
    Trigger,
    Exclusion,
    Unknown(String),
}

impl ConstraintType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "c" => ConstraintType::Check,
            "f" => ConstraintType::ForeignKey,
            "p" => ConstraintType::PrimaryKey,
            "u" => ConstraintType::Unique,
            "t" => ConstraintType::Trigger,
            "x" => ConstraintType::Exclusion,
            other => ConstraintType::Unknown(other.to_string()),
        }
    }

    /// Primary and foreign keys are rendered from their dedicated metadata.
    pub fn is_key(&self) -> bool {
        matches!(self, ConstraintType::PrimaryKey | ConstraintType::ForeignKey)
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintType::Check => write!(f, "CHECK"),
            ConstraintType::ForeignKey => write!(f, "FOREIGN KEY"),
            ConstraintType::PrimaryKey => write!(f, "PRIMARY KEY"),
            ConstraintType::Unique => write!(f, "UNIQUE"),
            ConstraintType::Trigger => write!(f, "TRIGGER"),
            ConstraintType::Exclusion => write!(f, "EXCLUSION"),
            ConstraintType::Unknown(code) => write!(f, "UNKNOWN ({})", code),
        }
    }
}

impl Serialize for ConstraintType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Table listing entry used by the table picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub schema: String,
    pub name: String,
    pub column_count: usize,
    pub primary_key: Vec<String>,
    pub full_name: String,
}

impl TableSummary {
    pub fn new(schema: &str, name: &str, column_count: usize, primary_key: Vec<String>) -> Self {
        let full_name = if schema == super::PUBLIC_SCHEMA {
            name.to_string()
        } else {
            format!("{}.{}", schema, name)
        };
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            column_count,
            primary_key,
            full_name,
        }
    }
}

/// Basic facts about a server, reported by a connection test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: String,
    pub database: String,
    pub size: String,
    pub table_count: i64,
}
