//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The chain append could not preserve the single-predecessor
    /// invariant, or the record/block pair could not commit together.
    /// Always fatal to the enclosing write.
    #[error("chain integrity violation: {0}")]
    ChainIntegrity(String),

    /// A stored value could not be decoded into its domain type.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The connection mutex was poisoned by a panicking writer.
    #[error("connection mutex poisoned")]
    Poisoned,

    /// A blocking task failed to complete.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
