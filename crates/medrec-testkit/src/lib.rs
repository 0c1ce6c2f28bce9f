//! # Medrec Testkit
//!
//! Testing utilities for the medrec ledger.
//!
//! ## Overview
//!
//! - **Fixtures**: a ready-made in-memory ledger with registered principals
//!   and helpers for the common setup steps (grant consent, commit records)
//! - **Generators**: proptest strategies over the domain's value types
//!
//! ## Test Fixtures
//!
//! ```rust
//! use medrec_testkit::TestFixture;
//!
//! # async fn example() {
//! let fixture = TestFixture::new().await;
//! let committed = fixture.commit_record("diagnosis", "notes").await;
//! assert_eq!(committed.block.block_id, 1);
//! # }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{fixture_vault, multi_requester_fixture, TestFixture, FIXTURE_KEY};
