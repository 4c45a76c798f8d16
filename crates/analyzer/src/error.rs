use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    #[error("top_count must be at least 1, got {0}")]
    InvalidTopCount(usize),
}
