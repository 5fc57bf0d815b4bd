use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, Config, NoTls};

use super::{Catalog, CatalogConnector, ConnectionParams};
use crate::db::ddl::{Generated, Identity, ReflectedColumn, ReflectedTable};
use crate::db::schema::{ColumnDescriptor, ConstraintRow, ForeignKey, IndexDescriptor, ServerInfo};
use crate::db::{TableRef, PUBLIC_SCHEMA};

const LIST_SCHEMAS_SQL: &str = "SELECT nspname FROM pg_catalog.pg_namespace ORDER BY nspname";

const LIST_TABLES_SQL: &str = "\
SELECT c.relname
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1 AND c.relkind IN ('r', 'p')
ORDER BY c.relname";

const COLUMNS_SQL: &str = "\
SELECT a.attname,
       pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
       NOT a.attnotnull AS nullable,
       CASE WHEN a.attgenerated = ''
            THEN pg_catalog.pg_get_expr(d.adbin, d.adrelid)
       END AS default_expr
FROM pg_catalog.pg_attribute a
JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
WHERE n.nspname = $1 AND c.relname = $2
  AND a.attnum > 0 AND NOT a.attisdropped
ORDER BY a.attnum";

const PRIMARY_KEY_SQL: &str = "\
SELECT a.attname
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
WHERE n.nspname = $1 AND c.relname = $2 AND con.contype = 'p'
ORDER BY k.ord";

const FOREIGN_KEYS_SQL: &str = "\
SELECT con.conname,
       la.attname AS local_column,
       rn.nspname AS referred_schema,
       rc.relname AS referred_table,
       ra.attname AS referred_column
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_class rc ON rc.oid = con.confrelid
JOIN pg_catalog.pg_namespace rn ON rn.oid = rc.relnamespace
CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
     WITH ORDINALITY AS k(local_attnum, referred_attnum, ord)
JOIN pg_catalog.pg_attribute la ON la.attrelid = con.conrelid AND la.attnum = k.local_attnum
JOIN pg_catalog.pg_attribute ra ON ra.attrelid = con.confrelid AND ra.attnum = k.referred_attnum
WHERE n.nspname = $1 AND c.relname = $2 AND con.contype = 'f'
ORDER BY con.conname, k.ord";

const INDEXES_SQL: &str = "\
SELECT ic.relname AS index_name,
       i.indisunique AS is_unique,
       a.attname
FROM pg_catalog.pg_index i
JOIN pg_catalog.pg_class c ON c.oid = i.indrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_class ic ON ic.oid = i.indexrelid
CROSS JOIN LATERAL unnest(i.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
LEFT JOIN pg_catalog.pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = k.attnum
WHERE n.nspname = $1 AND c.relname = $2
  AND NOT i.indisprimary
  AND k.ord <= i.indnkeyatts
ORDER BY ic.relname, k.ord";

const CONSTRAINTS_SQL: &str = "\
SELECT c.conname AS name,
       c.contype::text AS type,
       a.attname AS column_name,
       c.condeferrable AS deferrable,
       c.condeferred AS deferred,
       pg_catalog.pg_get_constraintdef(c.oid, true) AS definition
FROM pg_catalog.pg_constraint c
JOIN pg_catalog.pg_attribute a ON a.attrelid = c.conrelid AND a.attnum = ANY(c.conkey)
WHERE c.conrelid = (
    SELECT cl.oid
    FROM pg_catalog.pg_class cl
    JOIN pg_catalog.pg_namespace ns ON ns.oid = cl.relnamespace
    WHERE ns.nspname = $1 AND cl.relname = $2
)
ORDER BY c.conname, a.attnum";

const REFLECT_OID_SQL: &str = "\
SELECT c.oid, quote_ident(n.nspname) AS schema_ident, quote_ident(c.relname) AS table_ident
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1 AND c.relname = $2 AND c.relkind IN ('r', 'p')";

const REFLECT_COLUMNS_SQL: &str = "\
SELECT quote_ident(a.attname) AS name,
       pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
       a.attnotnull AS not_null,
       pg_catalog.pg_get_expr(d.adbin, d.adrelid) AS default_expr,
       a.attidentity::text AS identity,
       a.attgenerated::text AS generated
FROM pg_catalog.pg_attribute a
LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
WHERE a.attrelid = $1 AND a.attnum > 0 AND NOT a.attisdropped
ORDER BY a.attnum";

const REFLECT_CONSTRAINTS_SQL: &str = "\
SELECT quote_ident(conname) AS name,
       pg_catalog.pg_get_constraintdef(oid, true) AS definition
FROM pg_catalog.pg_constraint
WHERE conrelid = $1 AND contype IN ('p', 'u', 'f', 'c', 'x')
ORDER BY CASE contype
             WHEN 'p' THEN 0
             WHEN 'u' THEN 1
             WHEN 'f' THEN 2
             WHEN 'c' THEN 3
             ELSE 4
         END,
         conname";

const SERVER_INFO_SQL: &str = "\
SELECT version(),
       current_database()::text,
       pg_size_pretty(pg_database_size(current_database())),
       (SELECT count(*)
        FROM information_schema.tables
        WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
          AND table_type = 'BASE TABLE')";

/// Build a tokio-postgres config from resolved parameters
pub fn build_config(params: &ConnectionParams) -> Config {
    let mut config = Config::new();
    config
        .host(&params.host)
        .port(params.port)
        .user(&params.user)
        .dbname(&params.database)
        .application_name("pgassist")
        .connect_timeout(Duration::from_secs(params.connect_timeout_secs));
    if !params.password.is_empty() {
        config.password(&params.password);
    }
    config
}

/// Quoted table name for reflected DDL, following `TableRef::display_name`:
/// bare inside `public`, schema-qualified elsewhere.
fn reflected_name(table: &TableRef, schema_ident: &str, table_ident: &str) -> String {
    if table.schema == PUBLIC_SCHEMA {
        table_ident.to_string()
    } else {
        format!("{}.{}", schema_ident, table_ident)
    }
}

/// PostgreSQL connector using tokio-postgres
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresConnector;

#[async_trait]
impl CatalogConnector for PostgresConnector {
    async fn connect(&self, params: &ConnectionParams) -> anyhow::Result<Box<dyn Catalog>> {
        let addr = format!("{}:{}", params.host, params.port);
        let (client, connection) = build_config(params)
            .connect(NoTls)
            .await
            .context(format!("Failed to connect to PostgreSQL at {}", addr))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("PostgreSQL connection error: {}", e);
            }
        });

        log::debug!("Connected to PostgreSQL at {}/{}", addr, params.database);
        Ok(Box::new(PostgresCatalog {
            client: Some(client),
            driver: Some(driver),
        }))
    }
}

/// One live tokio-postgres session used for catalog queries
pub struct PostgresCatalog {
    client: Option<Client>,
    driver: Option<JoinHandle<()>>,
}

impl PostgresCatalog {
    fn client(&self) -> anyhow::Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| anyhow!("Not connected to PostgreSQL"))
    }
}

#[async_trait]
impl Catalog for PostgresCatalog {
    async fn ping(&self) -> anyhow::Result<()> {
        self.client()?
            .simple_query("SELECT 1")
            .await
            .context("Connection check failed")?;
        Ok(())
    }

    async fn list_schemas(&self) -> anyhow::Result<Vec<String>> {
        let rows = self
            .client()?
            .query(LIST_SCHEMAS_SQL, &[])
            .await
            .context("Failed to list schemas")?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(Into::into))
            .collect()
    }

    async fn list_tables(&self, schema: &str) -> anyhow::Result<Vec<String>> {
        let rows = self
            .client()?
            .query(LIST_TABLES_SQL, &[&schema])
            .await
            .context(format!("Failed to list tables in schema {}", schema))?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(Into::into))
            .collect()
    }

    async fn get_columns(&self, table: &TableRef) -> anyhow::Result<Vec<ColumnDescriptor>> {
        let rows = self
            .client()?
            .query(COLUMNS_SQL, &[&table.schema, &table.name])
            .await
            .context(format!("Failed to query columns of {}", table))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get("attname")?;
            let data_type: String = row.try_get("data_type")?;
            let nullable: bool = row.try_get("nullable")?;
            let default: Option<String> = row.try_get("default_expr")?;
            columns.push(ColumnDescriptor::new(
                &name,
                &data_type,
                nullable,
                default.as_deref(),
            ));
        }
        Ok(columns)
    }

    async fn get_primary_key(&self, table: &TableRef) -> anyhow::Result<Vec<String>> {
        let rows = self
            .client()?
            .query(PRIMARY_KEY_SQL, &[&table.schema, &table.name])
            .await
            .context(format!("Failed to query primary key of {}", table))?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(Into::into))
            .collect()
    }

    async fn get_foreign_keys(&self, table: &TableRef) -> anyhow::Result<Vec<ForeignKey>> {
        let rows = self
            .client()?
            .query(FOREIGN_KEYS_SQL, &[&table.schema, &table.name])
            .await
            .context(format!("Failed to query foreign keys of {}", table))?;

        let mut keys: Vec<ForeignKey> = Vec::new();
        for row in &rows {
            let name: String = row.try_get("conname")?;
            let local: String = row.try_get("local_column")?;
            let referred_schema: String = row.try_get("referred_schema")?;
            let referred_table: String = row.try_get("referred_table")?;
            let referred: String = row.try_get("referred_column")?;

            match keys.last_mut() {
                Some(fk) if fk.name == name => {
                    fk.columns.push(local);
                    fk.referred_columns.push(referred);
                }
                _ => {
                    let referred_table = if referred_schema == table.schema {
                        referred_table
                    } else {
                        format!("{}.{}", referred_schema, referred_table)
                    };
                    keys.push(ForeignKey {
                        name,
                        columns: vec![local],
                        referred_table,
                        referred_columns: vec![referred],
                    });
                }
            }
        }
        Ok(keys)
    }

    async fn get_indexes(&self, table: &TableRef) -> anyhow::Result<Vec<IndexDescriptor>> {
        let rows = self
            .client()?
            .query(INDEXES_SQL, &[&table.schema, &table.name])
            .await
            .context(format!("Failed to query indexes of {}", table))?;

        let mut indexes: Vec<IndexDescriptor> = Vec::new();
        for row in &rows {
            let name: String = row.try_get("index_name")?;
            let unique: bool = row.try_get("is_unique")?;
            // Expression entries have no attribute name.
            let column: Option<String> = row.try_get("attname")?;

            if !matches!(indexes.last(), Some(idx) if idx.name == name) {
                indexes.push(IndexDescriptor {
                    name,
                    columns: Vec::new(),
                    unique,
                });
            }
            if let (Some(idx), Some(column)) = (indexes.last_mut(), column) {
                idx.columns.push(column);
            }
        }
        Ok(indexes)
    }

    async fn get_constraints(&self, table: &TableRef) -> anyhow::Result<Vec<ConstraintRow>> {
        let rows = self
            .client()?
            .query(CONSTRAINTS_SQL, &[&table.schema, &table.name])
            .await
            .context(format!("Failed to query constraints of {}", table))?;

        let mut constraints = Vec::with_capacity(rows.len());
        for row in &rows {
            let parsed = ConstraintRow::from_catalog(
                row.try_get("name")?,
                row.try_get("type")?,
                row.try_get("column_name")?,
                row.try_get("deferrable")?,
                row.try_get("deferred")?,
                row.try_get("definition")?,
            );
            match parsed {
                Some(constraint) => constraints.push(constraint),
                None => log::warn!("Skipping incomplete constraint row on {}", table),
            }
        }
        Ok(constraints)
    }

    async fn reflect_table(&self, table: &TableRef) -> anyhow::Result<Option<ReflectedTable>> {
        let client = self.client()?;
        let Some(relation) = client
            .query_opt(REFLECT_OID_SQL, &[&table.schema, &table.name])
            .await
            .context(format!("Failed to reflect {}", table))?
        else {
            return Ok(None);
        };
        let oid: u32 = relation.try_get("oid")?;
        let qualified_name = reflected_name(
            table,
            relation.try_get("schema_ident")?,
            relation.try_get("table_ident")?,
        );

        let column_rows = client
            .query(REFLECT_COLUMNS_SQL, &[&oid])
            .await
            .context(format!("Failed to reflect columns of {}", table))?;
        let mut columns = Vec::with_capacity(column_rows.len());
        for row in &column_rows {
            let identity: String = row.try_get("identity")?;
            let generated: String = row.try_get("generated")?;
            columns.push(ReflectedColumn {
                name: row.try_get("name")?,
                data_type: row.try_get("data_type")?,
                not_null: row.try_get("not_null")?,
                default: row.try_get("default_expr")?,
                identity: Identity::from_code(&identity),
                generated: Generated::from_code(&generated),
            });
        }

        let constraint_rows = client
            .query(REFLECT_CONSTRAINTS_SQL, &[&oid])
            .await
            .context(format!("Failed to reflect constraints of {}", table))?;
        let mut constraints: Vec<(String, String)> = Vec::with_capacity(constraint_rows.len());
        for row in &constraint_rows {
            constraints.push((row.try_get("name")?, row.try_get("definition")?));
        }

        Ok(Some(ReflectedTable {
            qualified_name,
            columns,
            constraints,
        }))
    }

    async fn server_info(&self) -> anyhow::Result<ServerInfo> {
        let row = self
            .client()?
            .query_one(SERVER_INFO_SQL, &[])
            .await
            .context("Failed to query server information")?;
        Ok(ServerInfo {
            version: row.try_get(0)?,
            database: row.try_get(1)?,
            size: row.try_get(2)?,
            table_count: row.try_get(3)?,
        })
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        // Dropping the last client handle ends the connection task.
        self.client = None;
        if let Some(driver) = self.driver.take() {
            driver.await.context("PostgreSQL connection task failed")?;
        }
        Ok(())
    }
}
