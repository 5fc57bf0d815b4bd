//! In-memory catalog double shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pgassist_lib::db::connectors::{Catalog, CatalogConnector, ConnectionParams};
use pgassist_lib::db::ddl::ReflectedTable;
use pgassist_lib::db::schema::{
    ColumnDescriptor, ConstraintRow, ForeignKey, IndexDescriptor, ServerInfo,
};
use pgassist_lib::db::TableRef;

// ─── fixture data ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeTable {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<IndexDescriptor>,
    pub constraints: Vec<ConstraintRow>,
}

impl FakeTable {
    pub fn new(name: &str, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            ..Default::default()
        }
    }
}

#[derive(Clone, Default)]
pub enum Reflection {
    #[default]
    Unsupported,
    Table(ReflectedTable),
    Fails,
}

#[derive(Clone, Default)]
pub struct FakeDb {
    pub schemas: Vec<(String, Vec<FakeTable>)>,
    pub reflection: Reflection,
    pub fail_connect: bool,
    pub fail_ping: bool,
    pub fail_columns: bool,
    pub fail_indexes: bool,
    pub fail_constraints: bool,
    pub fail_list_schemas: bool,
}

impl FakeDb {
    pub fn with_schema(mut self, schema: &str, tables: Vec<FakeTable>) -> Self {
        self.schemas.push((schema.to_string(), tables));
        self
    }

    fn table(&self, table: &TableRef) -> anyhow::Result<&FakeTable> {
        self.schemas
            .iter()
            .filter(|(s, _)| *s == table.schema)
            .flat_map(|(_, tables)| tables.iter())
            .find(|t| t.name == table.name)
            .ok_or_else(|| anyhow::anyhow!("no such table {}", table))
    }
}

// ─── call counters ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Calls {
    pub connect: AtomicUsize,
    pub ping: AtomicUsize,
    pub list_schemas: AtomicUsize,
    pub list_tables: AtomicUsize,
    pub get_columns: AtomicUsize,
    pub get_primary_key: AtomicUsize,
    pub get_foreign_keys: AtomicUsize,
    pub get_indexes: AtomicUsize,
    pub get_constraints: AtomicUsize,
    pub reflect_table: AtomicUsize,
    pub server_info: AtomicUsize,
    pub close: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

impl Calls {
    /// Calls that read per-table metadata
    pub fn metadata(&self) -> usize {
        count(&self.get_columns)
            + count(&self.get_primary_key)
            + count(&self.get_foreign_keys)
            + count(&self.get_indexes)
            + count(&self.get_constraints)
            + count(&self.reflect_table)
    }
}

// ─── connector and catalog ─────────────────────────────────────────────────

pub struct FakeConnector {
    pub db: Arc<FakeDb>,
    pub calls: Arc<Calls>,
    pub last_params: std::sync::Mutex<Option<ConnectionParams>>,
}

impl FakeConnector {
    pub fn new(db: FakeDb) -> Self {
        Self {
            db: Arc::new(db),
            calls: Arc::new(Calls::default()),
            last_params: std::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl CatalogConnector for FakeConnector {
    async fn connect(&self, params: &ConnectionParams) -> anyhow::Result<Box<dyn Catalog>> {
        bump(&self.calls.connect);
        *self.last_params.lock().unwrap() = Some(params.clone());
        if self.db.fail_connect {
            anyhow::bail!("connection refused");
        }
        Ok(Box::new(FakeCatalog {
            db: self.db.clone(),
            calls: self.calls.clone(),
        }))
    }
}

pub struct FakeCatalog {
    db: Arc<FakeDb>,
    calls: Arc<Calls>,
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn ping(&self) -> anyhow::Result<()> {
        bump(&self.calls.ping);
        if self.db.fail_ping {
            anyhow::bail!("server closed the connection unexpectedly");
        }
        Ok(())
    }

    async fn list_schemas(&self) -> anyhow::Result<Vec<String>> {
        bump(&self.calls.list_schemas);
        if self.db.fail_list_schemas {
            anyhow::bail!("permission denied for pg_namespace");
        }
        Ok(self.db.schemas.iter().map(|(s, _)| s.clone()).collect())
    }

    async fn list_tables(&self, schema: &str) -> anyhow::Result<Vec<String>> {
        bump(&self.calls.list_tables);
        Ok(self
            .db
            .schemas
            .iter()
            .filter(|(s, _)| s == schema)
            .flat_map(|(_, tables)| tables.iter().map(|t| t.name.clone()))
            .collect())
    }

    async fn get_columns(&self, table: &TableRef) -> anyhow::Result<Vec<ColumnDescriptor>> {
        bump(&self.calls.get_columns);
        if self.db.fail_columns {
            anyhow::bail!("column query failed");
        }
        Ok(self.db.table(table)?.columns.clone())
    }

    async fn get_primary_key(&self, table: &TableRef) -> anyhow::Result<Vec<String>> {
        bump(&self.calls.get_primary_key);
        Ok(self.db.table(table)?.primary_key.clone())
    }

    async fn get_foreign_keys(&self, table: &TableRef) -> anyhow::Result<Vec<ForeignKey>> {
        bump(&self.calls.get_foreign_keys);
        Ok(self.db.table(table)?.foreign_keys.clone())
    }

    async fn get_indexes(&self, table: &TableRef) -> anyhow::Result<Vec<IndexDescriptor>> {
        bump(&self.calls.get_indexes);
        if self.db.fail_indexes {
            anyhow::bail!("index query failed");
        }
        Ok(self.db.table(table)?.indexes.clone())
    }

    async fn get_constraints(&self, table: &TableRef) -> anyhow::Result<Vec<ConstraintRow>> {
        bump(&self.calls.get_constraints);
        if self.db.fail_constraints {
            anyhow::bail!("column consrc does not exist");
        }
        Ok(self.db.table(table)?.constraints.clone())
    }

    async fn reflect_table(&self, _table: &TableRef) -> anyhow::Result<Option<ReflectedTable>> {
        bump(&self.calls.reflect_table);
        match &self.db.reflection {
            Reflection::Unsupported => Ok(None),
            Reflection::Table(t) => Ok(Some(t.clone())),
            Reflection::Fails => anyhow::bail!("reflection failed"),
        }
    }

    async fn server_info(&self) -> anyhow::Result<ServerInfo> {
        bump(&self.calls.server_info);
        Ok(ServerInfo {
            version: "PostgreSQL 16.2 on x86_64-pc-linux-gnu".to_string(),
            database: "shop".to_string(),
            size: "7953 kB".to_string(),
            table_count: self.db.schemas.iter().map(|(_, t)| t.len() as i64).sum(),
        })
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        bump(&self.calls.close);
        Ok(())
    }
}

// ─── sample tables ─────────────────────────────────────────────────────────

pub fn constraint(name: &str, code: &str, column: &str, definition: &str) -> ConstraintRow {
    ConstraintRow::from_catalog(
        Some(name.to_string()),
        Some(code.to_string()),
        Some(column.to_string()),
        Some(false),
        Some(false),
        Some(definition.to_string()),
    )
    .unwrap()
}

/// Composite primary key, one foreign key and one CHECK constraint.
pub fn order_lines() -> FakeTable {
    FakeTable {
        name: "order_lines".to_string(),
        columns: vec![
            ColumnDescriptor::new("order_id", "integer", false, None),
            ColumnDescriptor::new("line_no", "integer", false, None),
            ColumnDescriptor::new("sku", "character varying(32)", false, None),
            ColumnDescriptor::new("qty", "integer", false, Some("1")),
        ],
        primary_key: vec!["order_id".to_string(), "line_no".to_string()],
        foreign_keys: vec![ForeignKey {
            name: "order_lines_order_id_fkey".to_string(),
            columns: vec!["order_id".to_string()],
            referred_table: "orders".to_string(),
            referred_columns: vec!["id".to_string()],
        }],
        indexes: vec![IndexDescriptor {
            name: "order_lines_sku_idx".to_string(),
            columns: vec!["sku".to_string()],
            unique: false,
        }],
        constraints: vec![
            constraint("order_lines_order_id_fkey", "f", "order_id", "FOREIGN KEY (order_id) REFERENCES orders(id)"),
            constraint("order_lines_pkey", "p", "order_id", "PRIMARY KEY (order_id, line_no)"),
            constraint("order_lines_pkey", "p", "line_no", "PRIMARY KEY (order_id, line_no)"),
            constraint("qty_positive", "c", "qty", "CHECK ((qty > 0))"),
        ],
    }
}

pub fn users() -> FakeTable {
    FakeTable {
        name: "users".to_string(),
        columns: vec![
            ColumnDescriptor::new("id", "integer", false, Some("nextval('users_id_seq'::regclass)")),
            ColumnDescriptor::new("email", "text", false, None),
        ],
        primary_key: vec!["id".to_string()],
        ..Default::default()
    }
}

pub fn shop_db() -> FakeDb {
    FakeDb::default()
        .with_schema("pg_catalog", vec![FakeTable::new("pg_class", vec![])])
        .with_schema("information_schema", vec![FakeTable::new("tables", vec![])])
        .with_schema("public", vec![users(), order_lines()])
        .with_schema(
            "sales",
            vec![FakeTable::new(
                "invoices",
                vec![ColumnDescriptor::new("id", "bigint", false, None)],
            )],
        )
}
