//!
//! Jsonfield: tracked JSON document fields for record types.
//!
//! This library lets a persistence layer treat a record's JSON-typed columns
//! as first-class structured attributes instead of opaque strings, while
//! still reporting precisely which top-level fields and which nested JSON
//! keys changed since the value was loaded.
//!
//! ## Core Concepts
//!
//! * **Documents (`doc::JsonDocument`)**: The wrapper around one field's
//!   JSON value. It remembers the original decoded shape, exposes a live
//!   mutable key/value state, layers configured defaults over absent keys,
//!   and serializes back to a canonical JSON string on demand.
//! * **Values (`doc::Value`)**: The value tree stored inside documents.
//!   Nested containers are shared handles: mutating a key two levels deep
//!   through a returned handle is visible in the dirty diff without
//!   re-assigning the top-level key.
//! * **Registry (`registry::DocumentRegistry`)**: Maps field names to their
//!   documents, lazily constructing one per field, with dot-notation
//!   dirty/original lookups across all fields and the encoded write-back
//!   set collected before persistence.
//! * **Accessors (`registry::FieldAccessor`)**: Explicit field-bound
//!   handles the record layer exposes as field-named methods, replacing
//!   catch-all dynamic dispatch.

pub mod doc;
pub mod registry;

// Re-export the primary types for easier access.
pub use doc::{DocError, DocumentOptions, JsonDocument, List, Map, RawDocument, Value};
pub use registry::{DocumentRegistry, FieldAccessor};

/// Result type used throughout the jsonfield library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the jsonfield library.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured document errors from the doc module
    #[error(transparent)]
    Doc(doc::DocError),
}

impl Error {
    /// Check if this error is a typed-extraction mismatch
    pub fn is_type_error(&self) -> bool {
        matches!(self, Error::Doc(err) if err.is_type_error())
    }

    /// Check if this error is a missing-key lookup
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Doc(err) if err.is_not_found())
    }

    /// Check if this error is related to serialization
    pub fn is_serialization_error(&self) -> bool {
        match self {
            Error::Serialize(_) => true,
            Error::Doc(err) => err.is_serialization_error(),
        }
    }
}
