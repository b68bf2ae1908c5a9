use std::path::PathBuf;

use media_provider::{FailureKind, GenerationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error while {operation}: {source}")]
    Sqlite {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to encode session record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode session record: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("history entry {index} has an invalid payload: {reason}")]
    InvalidPayload { index: usize, reason: String },
}

impl StoreError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn sqlite(operation: &'static str, source: rusqlite::Error) -> Self {
        Self::Sqlite { operation, source }
    }

    /// True when the database file or the stored record is unreadable, as
    /// opposed to a transient I/O problem.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        match self {
            Self::Decode(_) | Self::InvalidPayload { .. } => true,
            Self::Sqlite { source, .. } => matches!(
                source.sqlite_error_code(),
                Some(rusqlite::ErrorCode::NotADatabase | rusqlite::ErrorCode::DatabaseCorrupt)
            ),
            Self::Io { .. } | Self::Encode(_) => false,
        }
    }

    /// The store failure in the shared failure taxonomy.
    #[must_use]
    pub fn to_generation_error(&self) -> GenerationError {
        GenerationError::new(FailureKind::StorageFailure, self.to_string())
    }

    #[must_use]
    pub fn invalid_payload(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            index,
            reason: reason.into(),
        }
    }
}
