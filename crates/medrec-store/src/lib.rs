//! # Medrec Store
//!
//! Storage abstraction for the medrec ledger. Provides a trait-based
//! interface for record, chain, and consent persistence with SQLite and
//! in-memory implementations.
//!
//! ## Overview
//!
//! The [`Store`] trait owns every atomicity guarantee the system relies on:
//!
//! - **Serialized chain appends**: [`Store::insert_record_with_block`] reads
//!   the newest block's hash and inserts the record and its block inside one
//!   serialized transaction. Concurrent appends can never observe the same
//!   predecessor, so the chain cannot fork.
//! - **One record, one block**: the record row and its block row commit
//!   together or not at all.
//! - **Atomic consent transitions**: grant/deny/revoke are single
//!   conditional updates; the state guard and the write are one statement.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::Store;
