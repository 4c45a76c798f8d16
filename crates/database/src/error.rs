use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    /// No session could be obtained at all (pool exhausted, server down).
    #[error("Failed to connect to the database: {0}")]
    Connection(String),

    /// The catalog could not be read during reflection. The whole schema
    /// build is abandoned when this happens.
    #[error("The database catalog is unavailable: {0}")]
    CatalogUnavailable(String),

    /// Any failure while running a caller-supplied statement, carrying the
    /// engine's own message verbatim.
    #[error("{0}")]
    QueryExecution(String),

    #[error("Database query failed: {0}")]
    Query(#[from] sqlx::Error),
}

impl DbError {
    pub fn connection(err: sqlx::Error) -> Self {
        DbError::Connection(engine_message(&err))
    }

    pub fn catalog(err: sqlx::Error) -> Self {
        DbError::CatalogUnavailable(engine_message(&err))
    }

    pub fn execution(err: sqlx::Error) -> Self {
        DbError::QueryExecution(engine_message(&err))
    }
}

/// The server's diagnostic text when there is one, otherwise the driver's.
fn engine_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    }
}
