use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] crmrelay_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("User ID cannot be empty")]
    EmptyUserId,
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("Invalid {kind} ID: {value}")]
    InvalidId { kind: &'static str, value: String },
    #[error("Invalid due date '{0}': expected RFC 3339, e.g. 2024-05-01T17:00:00Z")]
    InvalidDueDate(String),
    #[error("Sync failed: {0}")]
    SyncFailed(String),
}
