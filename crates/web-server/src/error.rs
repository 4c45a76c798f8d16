use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use database::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Analyzer error: {0}")]
    Analyzer(#[from] analyzer::AnalyzerError),
    #[error("Database error: {0}")]
    Unhealthy(String),
}

/// Maps a database failure to a status and the message the caller sees.
fn database_response(err: DbError) -> (StatusCode, String) {
    match err {
        // Caller-supplied statements report the engine's text verbatim.
        DbError::QueryExecution(message) => {
            tracing::warn!(error = %message, "Query execution error.");
            (StatusCode::BAD_REQUEST, message)
        }
        DbError::CatalogUnavailable(message) => {
            tracing::error!(error = %message, "Catalog unavailable.");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("The database catalog is unavailable: {message}"),
            )
        }
        DbError::Connection(message) => {
            tracing::error!(error = %message, "Database connection error.");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "The database is unavailable".to_string(),
            )
        }
        other => {
            tracing::error!(error = ?other, "Database error.");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal database error occurred".to_string(),
            )
        }
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(db_err) => database_response(db_err),
            AppError::Analyzer(analyzer::AnalyzerError::Database(db_err)) => {
                database_response(db_err)
            }
            AppError::Analyzer(invalid @ analyzer::AnalyzerError::InvalidTopCount(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, invalid.to_string())
            }
            AppError::Unhealthy(message) => {
                tracing::error!(error = %message, "Health check failed.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Database error: {message}"),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
