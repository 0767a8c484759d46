//! Error types for runledger.

use thiserror::Error;

use crate::model::QueueStatus;

#[derive(Debug, Error)]
pub enum Error {
    /// A referenced job, instance, resource, or token does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Input failed a closed-format check: a malformed credential or an
    /// unknown wire value. Rejected before any store access.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A store operation failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The backup sink rejected a write. The primary record is durable
    /// and unaffected.
    #[error("backup write failed for {key}: {reason}")]
    BackupWrite { key: String, reason: String },

    /// A bulk operation affected fewer records than requested. The
    /// successful subset has already been applied.
    #[error("partial batch: {created} of {requested} created, missing {missing:?}")]
    PartialBatch {
        requested: usize,
        created: usize,
        missing: Vec<String>,
    },

    /// Attempted to advance a job out of a terminal status.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: QueueStatus, to: QueueStatus },

    /// Credential verification failed. Deliberately carries no cause;
    /// the distinct internal failure kinds exist for logging only.
    #[error("credential verification failed")]
    Unauthorized,

    #[error("config error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Error::NotFound("row not found".to_string()),
            other => Error::Persistence(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
