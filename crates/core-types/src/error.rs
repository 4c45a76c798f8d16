use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Unsupported parameter value for '{0}': only null, booleans, numbers and strings can be bound")]
    UnsupportedValue(String),
}
