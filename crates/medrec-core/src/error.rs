//! Error types for the medrec core.

use thiserror::Error;

/// Validation errors, raised before any input reaches storage.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{field} exceeds {max} bytes (got {len})")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid chain hash: {0}")]
    InvalidHash(String),

    #[error("unknown consent status: {0}")]
    UnknownStatus(String),

    #[error("unknown consent duration: {0}")]
    UnknownDuration(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),
}
