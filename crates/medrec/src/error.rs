//! Error types for the ledger facade.

use thiserror::Error;

use medrec_consent::{ConsentError, DenialReason};
use medrec_core::ValidationError;
use medrec_store::StoreError;
use medrec_vault::CryptoError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed input, rejected before touching storage.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Consent operation failed (including the not-found/not-eligible case).
    #[error("consent error: {0}")]
    Consent(#[from] ConsentError),

    /// The consent gate said no. Distinct from validation so callers can
    /// map it to a forbidden response.
    #[error("authorization denied: {reason}")]
    AuthorizationDenied { reason: DenialReason },

    /// The acting principal's role does not permit this operation.
    #[error("not permitted: {0}")]
    NotPermitted(&'static str),

    /// Encryption or decryption failed on a path that surfaces it.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The record/block pair could not be committed as one unit. Fatal to
    /// the write; nothing was applied.
    #[error("chain integrity violation: {0}")]
    ChainIntegrity(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
