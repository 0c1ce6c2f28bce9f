//! # Medrec Consent
//!
//! The consent ledger and the read-time authorization gate.
//!
//! A requester asks a subject for access; the subject grants (with a
//! duration and scope), denies, or later revokes. The gate answers one
//! question on every third-party read: does a live grant exist for this
//! (requester, subject) pair right now?
//!
//! ## Design notes
//!
//! - Transitions are guarded at the storage layer: the state check and the
//!   write are one conditional update, so concurrent decisions on the same
//!   request cannot both win.
//! - The gate never caches. A revoke takes effect on the very next call.
//! - Expiry never rewrites the stored status; it is evaluated as a predicate
//!   each time the gate runs.

pub mod error;
pub mod gate;
pub mod ledger;

pub use error::{ConsentError, Result};
pub use gate::{ConsentGate, Decision, DenialReason};
pub use ledger::ConsentLedger;
