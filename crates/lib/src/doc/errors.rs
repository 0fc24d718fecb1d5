//! Error types for tracked document operations.
//!
//! Normal attribute access on a document never fails: malformed sources
//! decode to empty documents and unknown keys read as absent. The variants
//! here cover the typed access paths only.

use thiserror::Error;

/// Structured error types for document operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DocError {
    /// A typed extraction found a value of a different shape
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// A typed read named a key that is not present in the live state
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// Serialization of a typed value failed
    #[error("serialization failed: {reason}")]
    SerializationFailed { reason: String },

    /// Deserialization into a typed value failed
    #[error("deserialization failed: {reason}")]
    DeserializationFailed { reason: String },
}

impl DocError {
    /// Check if this error is a typed-extraction mismatch
    pub fn is_type_error(&self) -> bool {
        matches!(self, DocError::TypeMismatch { .. })
    }

    /// Check if this error is a missing-key lookup
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocError::KeyNotFound { .. })
    }

    /// Check if this error is related to serialization
    pub fn is_serialization_error(&self) -> bool {
        matches!(
            self,
            DocError::SerializationFailed { .. } | DocError::DeserializationFailed { .. }
        )
    }

    /// Get the key if this is a key-related error
    pub fn key(&self) -> Option<&str> {
        match self {
            DocError::KeyNotFound { key } => Some(key),
            _ => None,
        }
    }
}

// Conversion from DocError to the main Error type
impl From<DocError> for crate::Error {
    fn from(err: DocError) -> Self {
        crate::Error::Doc(err)
    }
}
