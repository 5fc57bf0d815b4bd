use serde::Serialize;

use super::schema::{ColumnDescriptor, ConstraintRow, ForeignKey};

const INDENT: &str = "    ";

/// Identity generation mode, decoded from `pg_attribute.attidentity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Identity {
    Always,
    ByDefault,
}

impl Identity {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "a" => Some(Identity::Always),
            "d" => Some(Identity::ByDefault),
            _ => None,
        }
    }

    fn clause(self) -> &'static str {
        match self {
            Identity::Always => "GENERATED ALWAYS AS IDENTITY",
            Identity::ByDefault => "GENERATED BY DEFAULT AS IDENTITY",
        }
    }
}

/// Generated-column kind, decoded from `pg_attribute.attgenerated`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Generated {
    Stored,
    Virtual,
}

impl Generated {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "s" => Some(Generated::Stored),
            "v" => Some(Generated::Virtual),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Generated::Stored => "STORED",
            Generated::Virtual => "VIRTUAL",
        }
    }
}

/// A column as rendered by the server.
///
/// For generated columns `default` holds the generation expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReflectedColumn {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub default: Option<String>,
    pub identity: Option<Identity>,
    pub generated: Option<Generated>,
}

/// Table structure reflected from the catalog, ready to render verbatim.
///
/// `constraints` holds `(name, pg_get_constraintdef)` pairs in declaration
/// order: primary key, unique, foreign keys, checks, exclusions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReflectedTable {
    pub qualified_name: String,
    pub columns: Vec<ReflectedColumn>,
    pub constraints: Vec<(String, String)>,
}

/// A way of producing `CREATE TABLE` text for one analyzed table.
pub trait CreateTableStrategy {
    fn name(&self) -> &'static str;
    fn render(&self) -> String;
}

fn wrap(table_name: &str, lines: &[String]) -> String {
    let body = lines
        .iter()
        .map(|line| format!("{}{}", INDENT, line))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("CREATE TABLE {} (\n{}\n);", table_name, body)
}

/// Renders the server's own reflection of the table.
pub struct ReflectedDdl {
    table: ReflectedTable,
}

impl ReflectedDdl {
    pub fn new(table: ReflectedTable) -> Self {
        Self { table }
    }
}

impl CreateTableStrategy for ReflectedDdl {
    fn name(&self) -> &'static str {
        "reflected"
    }

    fn render(&self) -> String {
        let mut lines: Vec<String> = self
            .table
            .columns
            .iter()
            .map(|col| {
                let mut line = format!("{} {}", col.name, col.data_type);
                if let Some(identity) = col.identity {
                    line.push(' ');
                    line.push_str(identity.clause());
                }
                match (&col.default, col.generated) {
                    (Some(expr), Some(generated)) => line.push_str(&format!(
                        " GENERATED ALWAYS AS ({}) {}",
                        expr,
                        generated.keyword()
                    )),
                    (Some(default), None) => line.push_str(&format!(" DEFAULT {}", default)),
                    (None, _) => {}
                }
                if col.not_null {
                    line.push_str(" NOT NULL");
                }
                line
            })
            .collect();

        lines.extend(
            self.table
                .constraints
                .iter()
                .map(|(name, definition)| format!("CONSTRAINT {} {}", name, definition)),
        );

        wrap(&self.table.qualified_name, &lines)
    }
}

/// Rebuilds `CREATE TABLE` text from introspected metadata.
///
/// Lines come out in a fixed order: columns, composite primary key, foreign
/// keys, then the remaining named constraints.
pub struct ManualDdl<'a> {
    pub table_name: &'a str,
    pub columns: &'a [ColumnDescriptor],
    pub primary_key: &'a [String],
    pub foreign_keys: &'a [ForeignKey],
    pub constraints: &'a [ConstraintRow],
}

impl<'a> ManualDdl<'a> {
    fn column_line(&self, column: &ColumnDescriptor) -> String {
        let mut line = format!("{} {}", column.name, column.data_type);
        if self.primary_key.len() == 1 && self.primary_key[0] == column.name {
            line.push_str(" PRIMARY KEY");
        }
        if !column.nullable {
            line.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            line.push_str(&format!(" DEFAULT {}", default));
        }
        line
    }

    fn foreign_key_line(fk: &ForeignKey) -> String {
        format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            fk.name,
            fk.columns.join(", "),
            fk.referred_table,
            fk.referred_columns.join(", ")
        )
    }

    /// One entry per constraint name, first-seen order, keys excluded.
    fn named_constraints(&self) -> Vec<&'a ConstraintRow> {
        let mut seen: Vec<&'a ConstraintRow> = Vec::new();
        for row in self.constraints {
            if row.constraint_type.is_key() {
                continue;
            }
            if !seen.iter().any(|s| s.name == row.name) {
                seen.push(row);
            }
        }
        seen
    }

    fn constraint_line(row: &ConstraintRow) -> String {
        match &row.definition {
            Some(definition) => format!(
                "CONSTRAINT {} {} {}",
                row.name, row.constraint_type, definition
            ),
            None => format!("CONSTRAINT {} {}", row.name, row.constraint_type),
        }
    }
}

impl CreateTableStrategy for ManualDdl<'_> {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn render(&self) -> String {
        let mut lines: Vec<String> = self.columns.iter().map(|c| self.column_line(c)).collect();

        if self.primary_key.len() > 1 {
            lines.push(format!("PRIMARY KEY ({})", self.primary_key.join(", ")));
        }

        lines.extend(self.foreign_keys.iter().map(Self::foreign_key_line));
        lines.extend(
            self.named_constraints()
                .into_iter()
                .map(Self::constraint_line),
        );

        wrap(self.table_name, &lines)
    }
}

/// Pick the reflected strategy when reflection succeeded,
/// otherwise fall back to rebuilding from metadata.
pub fn select_strategy<'a>(
    reflection: anyhow::Result<Option<ReflectedTable>>,
    manual: ManualDdl<'a>,
) -> Box<dyn CreateTableStrategy + 'a> {
    match reflection {
        Ok(Some(table)) => Box::new(ReflectedDdl::new(table)),
        Ok(None) => {
            log::debug!(
                "No reflection available for {}, building CREATE TABLE manually",
                manual.table_name
            );
            Box::new(manual)
        }
        Err(e) => {
            log::error!("Error generating CREATE TABLE SQL: {:#}", e);
            Box::new(manual)
        }
    }
}
