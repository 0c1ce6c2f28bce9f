//! Error types for the vault.

use thiserror::Error;

/// Errors that can occur while sealing or opening a field envelope.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The provisioned key is not the required length.
    #[error("vault key must be {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    /// Encryption failed inside the cipher.
    #[error("encryption failed: {0}")]
    Encrypt(String),

    /// The envelope is not well-formed (bad hex, too short, bad UTF-8).
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// The authentication tag did not verify: tampering, wrong key, or
    /// corruption.
    #[error("authentication failed")]
    AuthenticationFailed,
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
