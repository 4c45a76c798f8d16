use crate::error::DbError;
use async_trait::async_trait;
use core_types::{Column, ForeignKey};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

/// Read access to the storage engine's metadata catalog.
///
/// Every call except `list_tables` is scoped to one table, so reflecting `T`
/// tables costs `3·T` round trips. That is fine for introspection endpoints
/// and is not meant for hot paths.
#[async_trait]
pub trait CatalogReader: Send {
    /// Table names, sorted by name so that repeated reflection of an unchanged
    /// schema lists them in the same order.
    async fn list_tables(&mut self) -> Result<Vec<String>, DbError>;

    /// Columns in their ordinal position, not sorted by name.
    async fn list_columns(&mut self, table: &str) -> Result<Vec<Column>, DbError>;

    /// Primary key columns in key order; empty if the table has none.
    async fn list_primary_key(&mut self, table: &str) -> Result<Vec<String>, DbError>;

    /// One entry per referencing column. A composite key yields one entry per
    /// column pair, in key order.
    async fn list_foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>, DbError>;
}

mod queries {
    /// Ordinary and partitioned tables of one schema.
    pub const LIST_TABLES: &str = r#"
        SELECT c.relname::text AS table_name
        FROM pg_catalog.pg_class c
        JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname = $1
          AND c.relkind IN ('r', 'p')
        ORDER BY c.relname
        "#;

    pub const LIST_COLUMNS: &str = r#"
        SELECT
            a.attname::text AS column_name,
            pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
            NOT a.attnotnull AS is_nullable
        FROM pg_catalog.pg_attribute a
        JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
        JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname = $1
          AND c.relname = $2
          AND a.attnum > 0
          AND NOT a.attisdropped
        ORDER BY a.attnum
        "#;

    pub const LIST_PRIMARY_KEY: &str = r#"
        SELECT a.attname::text AS column_name
        FROM pg_catalog.pg_index i
        JOIN pg_catalog.pg_class c ON c.oid = i.indrelid
        JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid AND a.attnum = ANY(i.indkey)
        WHERE n.nspname = $1
          AND c.relname = $2
          AND i.indisprimary
        ORDER BY array_position(i.indkey::int2[], a.attnum)
        "#;

    pub const LIST_FOREIGN_KEYS: &str = r#"
        SELECT
            src.attname::text AS column_name,
            dst_class.relname::text AS referenced_table,
            dst.attname::text AS referenced_column
        FROM pg_catalog.pg_constraint con
        JOIN pg_catalog.pg_class src_class ON src_class.oid = con.conrelid
        JOIN pg_catalog.pg_namespace n ON n.oid = src_class.relnamespace
        JOIN pg_catalog.pg_class dst_class ON dst_class.oid = con.confrelid
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
            WITH ORDINALITY AS k(src_attnum, dst_attnum, key_position)
        JOIN pg_catalog.pg_attribute src
            ON src.attrelid = con.conrelid AND src.attnum = k.src_attnum
        JOIN pg_catalog.pg_attribute dst
            ON dst.attrelid = con.confrelid AND dst.attnum = k.dst_attnum
        WHERE n.nspname = $1
          AND src_class.relname = $2
          AND con.contype = 'f'
        ORDER BY con.conname, k.key_position
        "#;
}

/// Reads the PostgreSQL system catalog over one checked-out connection.
///
/// The reader borrows the connection rather than the pool, so a whole schema
/// build runs on a single session and the connection goes back to the pool
/// when the caller's guard drops.
pub struct PgCatalogReader<'c> {
    conn: &'c mut PgConnection,
    schema: String,
}

impl<'c> PgCatalogReader<'c> {
    pub fn new(conn: &'c mut PgConnection, schema: impl Into<String>) -> Self {
        Self {
            conn,
            schema: schema.into(),
        }
    }

    async fn fetch(&mut self, sql: &str, table: Option<&str>) -> Result<Vec<PgRow>, DbError> {
        let mut query = sqlx::query(sql).bind(&self.schema);
        if let Some(table) = table {
            query = query.bind(table);
        }
        query
            .fetch_all(&mut *self.conn)
            .await
            .map_err(DbError::catalog)
    }
}

#[async_trait]
impl<'c> CatalogReader for PgCatalogReader<'c> {
    async fn list_tables(&mut self) -> Result<Vec<String>, DbError> {
        let rows = self.fetch(queries::LIST_TABLES, None).await?;
        rows.iter()
            .map(|row| row.try_get("table_name").map_err(DbError::catalog))
            .collect()
    }

    async fn list_columns(&mut self, table: &str) -> Result<Vec<Column>, DbError> {
        let rows = self.fetch(queries::LIST_COLUMNS, Some(table)).await?;
        rows.iter()
            .map(|row| {
                let name: String = row.try_get("column_name").map_err(DbError::catalog)?;
                let data_type: String = row.try_get("data_type").map_err(DbError::catalog)?;
                let nullable: bool = row.try_get("is_nullable").map_err(DbError::catalog)?;
                Ok(Column::new(name, data_type, nullable))
            })
            .collect()
    }

    async fn list_primary_key(&mut self, table: &str) -> Result<Vec<String>, DbError> {
        let rows = self.fetch(queries::LIST_PRIMARY_KEY, Some(table)).await?;
        rows.iter()
            .map(|row| row.try_get("column_name").map_err(DbError::catalog))
            .collect()
    }

    async fn list_foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>, DbError> {
        let rows = self.fetch(queries::LIST_FOREIGN_KEYS, Some(table)).await?;
        rows.iter()
            .map(|row| {
                let column: String = row.try_get("column_name").map_err(DbError::catalog)?;
                let target_table: String =
                    row.try_get("referenced_table").map_err(DbError::catalog)?;
                let target_column: String =
                    row.try_get("referenced_column").map_err(DbError::catalog)?;
                Ok(ForeignKey::new(column, target_table, target_column))
            })
            .collect()
    }
}
