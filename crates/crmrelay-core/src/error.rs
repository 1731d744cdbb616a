//! Error types for crmrelay-core

use std::time::Duration;

use thiserror::Error;

/// Result type alias using crmrelay-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in crmrelay-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Requesting user does not own the record
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// CRM integration missing, disabled, or without a credential
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Entity or sync record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// CRM call rejected or network failure
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Retry attempted before the backoff window elapsed
    #[error(
        "Backoff not elapsed: {} of {} minutes waited",
        .elapsed.as_secs() / 60,
        .required.as_secs() / 60
    )]
    BackoffNotElapsed {
        required: Duration,
        elapsed: Duration,
    },

    /// Retry ceiling reached
    #[error("Retry limit reached ({retry_count}/{max_retries})")]
    RetryExhausted { retry_count: u32, max_retries: u32 },

    /// Record is not in a retryable state
    #[error("Sync record {0} is not in failed state")]
    RetryNotApplicable(String),

    /// Another retry claimed the record first
    #[error("Sync record {0} was claimed by a concurrent retry")]
    RetryConflict(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether a later retry of the same record could succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExternalService(_) | Self::BackoffNotElapsed { .. } | Self::RetryConflict(_)
        )
    }
}
