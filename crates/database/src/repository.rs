use crate::catalog::PgCatalogReader;
use crate::error::DbError;
use crate::executor::{AdHocQueryExecutor, PgStatementEngine};
use crate::schema_builder::SchemaModelBuilder;
use core_types::SchemaModel;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::FromRow;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It owns the pool; every method checks out its own
/// connection and returns it when the method exits, on success or failure.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
    schema: String,
}

/// One customer's payment totals, as ranked by the payment analysis.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CustomerPaymentSummary {
    pub customer_id: i32,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_paid: Decimal,
    pub payment_count: i64,
}

impl DbRepository {
    /// Creates a new `DbRepository`. `schema` scopes catalog reflection.
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    async fn acquire(&self) -> Result<PoolConnection<Postgres>, DbError> {
        self.pool.acquire().await.map_err(DbError::connection)
    }

    /// Round-trips `SELECT 1`.
    pub async fn ping(&self) -> Result<(), DbError> {
        let mut conn = self.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }

    /// Reflects the configured schema from the catalog. Always a fresh read.
    pub async fn reflect_schema(&self) -> Result<SchemaModel, DbError> {
        let mut conn = self.acquire().await?;
        let reader = PgCatalogReader::new(&mut *conn, self.schema.clone());
        SchemaModelBuilder::new(reader).build().await
    }

    /// Per-customer payment totals, highest `total_paid` first. Ties are
    /// broken by customer id so the ranking is stable between calls.
    pub async fn get_customer_payment_totals(
        &self,
    ) -> Result<Vec<CustomerPaymentSummary>, DbError> {
        let mut conn = self.acquire().await?;
        let totals = sqlx::query_as::<_, CustomerPaymentSummary>(
            r#"
            SELECT
                c.customer_id,
                c.first_name,
                c.last_name,
                SUM(p.amount) AS total_paid,
                COUNT(p.payment_id) AS payment_count
            FROM customer c
            JOIN payment p ON c.customer_id = p.customer_id
            GROUP BY c.customer_id, c.first_name, c.last_name
            ORDER BY total_paid DESC, c.customer_id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(totals)
    }

    /// An executor for caller-supplied statements over this repository's pool.
    pub fn ad_hoc_executor(&self) -> AdHocQueryExecutor<PgStatementEngine> {
        AdHocQueryExecutor::new(PgStatementEngine::new(self.pool.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn payment_summary_serializes_total_as_a_number() {
        let summary = CustomerPaymentSummary {
            customer_id: 526,
            first_name: "KARL".into(),
            last_name: "SEAL".into(),
            total_paid: dec!(221.55),
            payment_count: 45,
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({
                "customer_id": 526,
                "first_name": "KARL",
                "last_name": "SEAL",
                "total_paid": 221.55,
                "payment_count": 45
            })
        );
    }
}
