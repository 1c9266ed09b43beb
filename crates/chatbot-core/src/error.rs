//! Error types for payload marshalling.
//!
//! Marshalling fails for bad input or for a schema defect:
//!
//! - [`MarshalError::Payload`]: the payload as a whole is unusable (not JSON,
//!   not an object).
//! - [`MarshalError::Validation`]: one field of the payload is wrong for the
//!   record being built (a required field is missing, a value has the wrong
//!   shape, a timestamp is out of range).
//! - [`MarshalError::TypeResolution`]: a descriptor table points at a record
//!   type that is not registered. This is a schema defect, not bad input.

use thiserror::Error;

/// Errors produced by [`from_payload`](crate::marshal::from_payload) and
/// schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// The payload as a whole cannot be decoded into the record.
    #[error("invalid {record} payload: {reason}")]
    Payload {
        record: &'static str,
        reason: String,
    },

    /// A field of the payload does not satisfy the record's structural requirements.
    #[error("invalid {record} payload: field '{field}' {reason}")]
    Validation {
        /// Record being decoded.
        record: &'static str,
        /// Offending payload key.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// A nested-record field names a type that no registered record matches.
    #[error("cannot resolve type '{type_name}' declared by {record}.{field}")]
    TypeResolution {
        /// Record declaring the field.
        record: &'static str,
        /// Field whose type failed to resolve.
        field: &'static str,
        /// The unresolved type name.
        type_name: &'static str,
    },
}

impl MarshalError {
    /// Creates an error for a payload that is unusable as a whole.
    pub fn payload(record: &'static str, reason: impl Into<String>) -> Self {
        Self::Payload {
            record,
            reason: reason.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(record: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            record,
            field,
            reason: reason.into(),
        }
    }

    /// Creates a "missing required field" validation error.
    pub fn missing(record: &'static str, field: &'static str) -> Self {
        Self::validation(record, field, "is required but missing")
    }

    /// Returns `true` for schema defects rather than bad input.
    pub fn is_type_resolution(&self) -> bool {
        matches!(self, Self::TypeResolution { .. })
    }
}

/// Result type for marshalling operations.
pub type MarshalResult<T> = Result<T, MarshalError>;
