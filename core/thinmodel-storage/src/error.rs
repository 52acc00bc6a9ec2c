//! Error types for the storage layer.

use thinmodel_model::ModelError;
use thinmodel_types::EntityId;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No record under this kind and identity.
    #[error("{kind} {id} not found")]
    NotFound { kind: String, id: EntityId },

    /// The entity has no identity to look up.
    #[error("{0} instance has no identity")]
    MissingIdentity(String),

    /// The kind's identity sequence has run past `u64::MAX`.
    #[error("no identities left for {0}")]
    IdentityExhausted(String),

    /// A cursor token this adapter did not issue.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}

impl From<StorageError> for ModelError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { kind, id } => ModelError::NotFound { kind, id },
            StorageError::MissingIdentity(kind) => ModelError::MissingIdentity { kind },
            e @ StorageError::IdentityExhausted(_) => ModelError::Storage(e.to_string()),
            StorageError::InvalidCursor(token) => {
                ModelError::InvalidQuery(format!("invalid cursor: {token}"))
            }
        }
    }
}
