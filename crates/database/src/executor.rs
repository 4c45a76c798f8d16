//! Free-form statement execution.
//!
//! **Not for untrusted callers.** The statement text is entirely
//! caller-controlled: there is no authorization, no statement allow-listing and
//! no permission scoping beyond what the database role itself allows.
//! Parameter *values* are always bound, so a value can never be read as SQL,
//! but the statement around them can do anything the role can.

use crate::decode::{column_names, decode_row};
use crate::error::DbError;
use crate::params::NamedStatement;
use async_trait::async_trait;
use core_types::{QueryResult, ScalarValue};
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArguments, PgConnection, PgPool, PgTypeInfo};
use sqlx::query::Query;
use sqlx::{Either, Executor, Postgres, Statement, TypeInfo};
use std::collections::HashMap;

/// Column names plus value rows, before they are zipped into `QueryRow`s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ScalarValue>>,
}

/// Runs one parsed statement with its values in positional order and hands
/// back raw rows.
#[async_trait]
pub trait StatementEngine: Send + Sync {
    async fn fetch(
        &self,
        statement: &NamedStatement,
        params: &[ScalarValue],
    ) -> Result<TabularRows, DbError>;
}

/// PostgreSQL engine. Each call checks out its own connection, runs the
/// statement in a transaction and rolls it back, so writes never persist.
///
/// Text and null values are sent as `text` and converted by the server to
/// the type it infers for their position, so `rating = :r` with `"PG-13"` or
/// `payment_date > :d` with `"2022-03-15"` work as written.
#[derive(Debug, Clone)]
pub struct PgStatementEngine {
    pool: PgPool,
}

impl PgStatementEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatementEngine for PgStatementEngine {
    async fn fetch(
        &self,
        statement: &NamedStatement,
        params: &[ScalarValue],
    ) -> Result<TabularRows, DbError> {
        let mut tx = self.pool.begin().await.map_err(DbError::connection)?;

        let fetched = match text_casts(&mut *tx, statement, params).await {
            Ok(casts) => {
                let sql = statement.sql_with_casts(&casts);
                let query = params.iter().fold(sqlx::query(&sql), bind_scalar);
                query.fetch_all(&mut *tx).await.map_err(DbError::execution)
            }
            Err(e) => Err(e),
        };

        if let Err(e) = tx.rollback().await {
            tracing::warn!(error = %e, "Rollback after ad-hoc statement failed.");
        }

        let rows = fetched?;
        Ok(TabularRows {
            columns: rows.first().map(column_names).unwrap_or_default(),
            rows: rows.iter().map(decode_row).collect(),
        })
    }
}

/// Asks the server which type it infers for each parameter and returns, per
/// position, the SQL type name a text or null value has to be converted to.
/// Skips the round trip when no such value is bound.
async fn text_casts(
    conn: &mut PgConnection,
    statement: &NamedStatement,
    params: &[ScalarValue],
) -> Result<Vec<Option<String>>, DbError> {
    if !params.iter().any(carried_as_text) {
        return Ok(Vec::new());
    }

    let prepared = (&mut *conn)
        .prepare(statement.sql())
        .await
        .map_err(DbError::execution)?;
    let inferred: Vec<PgTypeInfo> = match prepared.parameters() {
        Some(Either::Left(types)) => types.to_vec(),
        _ => Vec::new(),
    };

    let mut type_names: HashMap<u32, String> = HashMap::new();
    let mut casts = Vec::with_capacity(params.len());
    for (position, value) in params.iter().enumerate() {
        let target = inferred
            .get(position)
            .filter(|info| carried_as_text(value) && !accepts_text(info.name()))
            .and_then(PgTypeInfo::oid);
        let cast = match target {
            Some(oid) => {
                if !type_names.contains_key(&oid.0) {
                    let name = sql_type_name(&mut *conn, oid).await?;
                    type_names.insert(oid.0, name);
                }
                type_names.get(&oid.0).cloned()
            }
            None => None,
        };
        casts.push(cast);
    }

    tracing::debug!(casts = ?casts, "Resolved parameter conversions.");
    Ok(casts)
}

/// The type as it is spelled in SQL, schema-qualified and quoted when needed.
async fn sql_type_name(conn: &mut PgConnection, oid: Oid) -> Result<String, DbError> {
    sqlx::query_scalar::<_, String>("SELECT pg_catalog.format_type($1, NULL)")
        .bind(oid)
        .fetch_one(conn)
        .await
        .map_err(DbError::execution)
}

/// Values the server receives as `text`.
fn carried_as_text(value: &ScalarValue) -> bool {
    matches!(value, ScalarValue::Text(_) | ScalarValue::Null)
}

/// Inferred parameter types that take a `text` value without conversion.
fn accepts_text(type_name: &str) -> bool {
    matches!(
        type_name,
        "TEXT" | "VARCHAR" | "CHAR" | "NAME" | "UNKNOWN" | "citext"
    )
}

/// Binds one value with the PostgreSQL type its variant maps to. `Null`
/// binds as a text NULL and is converted like any other text value.
fn bind_scalar<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &ScalarValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        ScalarValue::Null => query.bind(None::<String>),
        ScalarValue::Bool(b) => query.bind(*b),
        ScalarValue::Int(i) => query.bind(*i),
        ScalarValue::Float(f) => query.bind(*f),
        ScalarValue::Decimal(d) => query.bind(*d),
        ScalarValue::Text(s) => query.bind(s.clone()),
    }
}

/// Executes caller-supplied statements with named parameters and normalizes
/// the rows. See the module docs before exposing this to anyone.
#[derive(Debug, Clone)]
pub struct AdHocQueryExecutor<E> {
    engine: E,
}

impl<E: StatementEngine> AdHocQueryExecutor<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Runs `statement` with `params` bound by name.
    ///
    /// Every failure (syntax, missing relation, constraint, permission, type
    /// mismatch, unbound placeholder, raw `$n` parameter) comes back as
    /// `DbError::QueryExecution` with the engine's message, except a failure
    /// to get a connection at all, which is `DbError::Connection`.
    #[tracing::instrument(name = "ad_hoc_query", skip(self, statement, params), fields(params = params.len()))]
    pub async fn execute(
        &self,
        statement: &str,
        params: &HashMap<String, ScalarValue>,
    ) -> Result<QueryResult, DbError> {
        let named = NamedStatement::parse(statement)?;
        let values = named.bind(params)?;

        let raw = self
            .engine
            .fetch(&named, &values)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Ad-hoc statement failed."))?;

        tracing::debug!(
            columns = raw.columns.len(),
            rows = raw.rows.len(),
            "Ad-hoc statement returned."
        );
        Ok(QueryResult::from_columns(&raw.columns, raw.rows))
    }
}
