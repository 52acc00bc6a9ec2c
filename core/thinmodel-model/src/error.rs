//! Error types for the model layer.

use thinmodel_types::EntityId;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while declaring kinds, writing fields or talking
/// to a storage adapter.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A field write was rejected because the value has the wrong type.
    #[error("invalid property type for {field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// The kind declares no field with this name.
    #[error("{kind} has no property {field}")]
    UnknownField { kind: String, field: String },

    /// The kind declares no method with this name.
    #[error("{kind} has no method {method}")]
    UnknownMethod { kind: String, method: String },

    /// No configured adapter is bound to the kind.
    #[error("storage adapter not ready for {kind}")]
    AdapterNotReady { kind: String },

    /// A required field holds no value.
    #[error("{kind} failed validation, missing required: {}", .missing.join(", "))]
    ValidationFailed { kind: String, missing: Vec<String> },

    /// `use_adapter` was given an unknown name or an empty one.
    #[error("adapter not found or provided: {0:?}")]
    AdapterLookupFailed(String),

    /// No stored record exists for this kind and identity.
    #[error("{kind} {id} not found")]
    NotFound { kind: String, id: EntityId },

    /// The operation needs an identity and the instance has none.
    #[error("{kind} instance has no identity")]
    MissingIdentity { kind: String },

    /// The query specification could not be interpreted.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A bulk write was given something other than a map of fields.
    #[error("invalid fields: {0}")]
    InvalidFields(String),

    /// Backend failure with no dedicated variant. Adapters report their
    /// own error types through this one.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ModelError {
    /// True for the backend-originated "no such record" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
