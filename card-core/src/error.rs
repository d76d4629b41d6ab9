//! Error types for card document operations.

use thiserror::Error;

/// Result type for card document operations.
pub type CardResult<T> = Result<T, CardError>;

/// Errors that can occur at the document boundary.
#[derive(Debug, Error)]
pub enum CardError {
    /// A document or element specification failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The payload is not well-formed JSON for the document shape.
    #[error("Malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A serialized document exceeds the configured byte ceiling.
    #[error("Document is {measured_bytes} bytes, limit is {limit_bytes} bytes")]
    PayloadTooLarge {
        /// Exact byte length of the serialized document.
        measured_bytes: usize,
        /// Configured ceiling in bytes.
        limit_bytes: usize,
    },
}

/// Validation failures, each carrying the specific field at fault.
///
/// Field paths use the wire spelling, e.g. `elements[3].size.width`, so the
/// message can be surfaced to API clients unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A field holds a value of the wrong JSON type.
    #[error("Field {field} must be {expected}")]
    WrongType {
        /// Path of the offending field.
        field: String,
        /// What the field must hold.
        expected: &'static str,
    },

    /// The element `type` tag is not one of the supported kinds.
    #[error("Unsupported element type: {0}")]
    UnsupportedType(String),

    /// A numeric field must be strictly positive.
    #[error("Field {0} must be positive")]
    NonPositive(String),

    /// A numeric field must be finite.
    #[error("Field {0} must be a finite number")]
    NotFinite(String),

    /// A string field must not be empty.
    #[error("Field {0} must not be empty")]
    Empty(String),

    /// Two elements share an id.
    #[error("Duplicate element id: {0}")]
    DuplicateId(String),
}
