use thiserror::Error;

/// Top-level error type for Daybell.
#[derive(Debug, Error)]
pub enum DaybellError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Persistent store error.
    #[error("store error: {0}")]
    Store(String),

    /// Notification delivery error.
    #[error("notify error: {0}")]
    Notify(String),

    /// Rejected user input (bad time string, unknown id, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
