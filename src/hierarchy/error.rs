use thiserror::Error;

use crate::store::StoreError;

/// Failures of the hierarchy operations (reconcile, cascade delete, lookups)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HierarchyError {
    #[error("Invalid {kind} ID format: '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("QR code generation failed: {0}")]
    GenerationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store fault: {0}")]
    StoreFault(String),
}

impl HierarchyError {
    pub fn invalid_identifier(kind: &'static str, value: impl Into<String>) -> Self {
        HierarchyError::InvalidIdentifier {
            kind,
            value: value.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HierarchyError::NotFound(message.into())
    }

    pub fn invalid_document(message: impl Into<String>) -> Self {
        HierarchyError::InvalidDocument(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        HierarchyError::GenerationError(message.into())
    }
}

impl From<StoreError> for HierarchyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => HierarchyError::InvalidDocument(msg),
            err @ (StoreError::Timeout { .. } | StoreError::Sqlx(_)) => {
                tracing::error!("Store unavailable: {}", err);
                HierarchyError::StoreUnavailable(err.to_string())
            }
            // Retrying will not help with these
            other => {
                tracing::error!("Store fault: {}", other);
                HierarchyError::StoreFault(other.to_string())
            }
        }
    }
}

impl From<crate::auth::AuthError> for HierarchyError {
    fn from(err: crate::auth::AuthError) -> Self {
        HierarchyError::Unauthorized(err.to_string())
    }
}
