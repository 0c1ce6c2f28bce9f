//! Error types for the consent module.

use thiserror::Error;

use medrec_core::ValidationError;
use medrec_store::StoreError;

/// Errors that can occur during consent operations.
#[derive(Debug, Error)]
pub enum ConsentError {
    /// Malformed input, rejected before touching storage.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The state-machine guard failed: the request is absent, owned by a
    /// different subject, or not in the required state. Deliberately
    /// indistinguishable from "no such request" so callers cannot probe for
    /// existence.
    #[error("request not found or not eligible")]
    NotEligible,

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for consent operations.
pub type Result<T> = std::result::Result<T, ConsentError>;
