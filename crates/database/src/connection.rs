use crate::error::DbError;
use configuration::DatabaseSettings;
use dotenvy::dotenv;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;

/// Establishes a connection pool to the PostgreSQL database.
///
/// The connection string is read from `DATABASE_URL` (a `.env` file is loaded
/// first when present). The pool is the only shared handle in the system;
/// every request checks a connection out of it and returns it on drop.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    // A missing .env file is fine as long as the variable is set elsewhere.
    dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .map_err(|_e| DbError::ConnectionConfigError("DATABASE_URL must be set.".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout())
        .connect(&database_url)
        .await
        .map_err(DbError::connection)?;

    tracing::info!(
        max_connections = settings.max_connections,
        schema = %settings.schema,
        "Database pool established."
    );
    Ok(pool)
}
