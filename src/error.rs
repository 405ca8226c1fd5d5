use thiserror::Error;

/// Errors raised by the expense store and its key-value substrate
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid id counter value: {0:?}")]
    InvalidCounter(String),

    #[error("incomplete expense, missing: {}", missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },
}

pub type Result<T> = std::result::Result<T, StoreError>;
