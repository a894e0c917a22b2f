//! Common error types for Color Hunt

use thiserror::Error;

/// Common result type for Color Hunt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Color Hunt services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed request field; rejected before any side effect
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or invalid identity token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Actor does not own the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Request is well formed but the resource's state forbids it
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Image could not be fetched or decoded
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// Image fetch exceeded the configured wait
    #[error("Image fetch timed out after {0} ms")]
    FetchTimeout(u64),

    /// Store contention persisted after all retries
    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for SQLite busy/locked conditions raised when a concurrent
    /// transaction holds or invalidated the write lock.
    pub fn is_transient_conflict(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => {
                let busy_or_locked = db_err
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| matches!(code & 0xff, 5 | 6))
                    .unwrap_or(false);
                busy_or_locked || db_err.message().contains("database is locked")
            }
            _ => false,
        }
    }
}
