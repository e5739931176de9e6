//! Error taxonomy for the expense tracker.
//!
//! Everything here is recoverable from the caller's point of view:
//! validation, authentication and stale-index errors abort the operation
//! with no state change, storage load errors degrade through the backup
//! file, and report errors never leave a partial file behind.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Bad or missing user input. The operation was aborted before any
    /// state changed.
    #[error("{0}")]
    Validation(String),

    /// Login attempt for a username that is not in the store.
    #[error("unknown username '{0}'")]
    UnknownUser(String),

    /// Login attempt with the wrong password for an existing account.
    #[error("wrong password for user '{0}'")]
    WrongPassword(String),

    /// Stale selection on edit/delete. The ledger was not mutated.
    #[error("expense index {index} is out of bounds for a ledger of {len} records")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("report generation failed: {0}")]
    Report(anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
