//! # Medrec
//!
//! The unified API for the medrec system: consent-gated reads over a
//! hash-chained medical record ledger.
//!
//! ## Overview
//!
//! Two coupled mechanisms with real invariants:
//!
//! - **Consent**: a subject (patient) controls time-bounded, revocable
//!   grants that a requester (doctor) needs before reading the subject's
//!   records. Every third-party read passes the gate; owners bypass it.
//! - **Integrity**: every record write appends exactly one block to an
//!   append-only hash chain, in the same storage transaction. Any later
//!   mutation of a record invalidates every subsequent link.
//!
//! Everything else - routing, token issuance, file storage, process wiring -
//! is a collaborator, not part of this workspace.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use medrec::{Ledger, LedgerConfig, RecordDraft};
//! use medrec::core::{Principal, PrincipalId, Role};
//! use medrec::store::SqliteStore;
//! use medrec::vault::VaultKey;
//!
//! async fn example() {
//!     let store = SqliteStore::open("medrec.db").unwrap();
//!     let config = LedgerConfig::new(VaultKey::from_bytes([0u8; 32]));
//!     let ledger = Ledger::new(store, config);
//!
//!     let doctor = Principal::new(PrincipalId::generate(), "dr. House", Role::Requester);
//!     let patient = Principal::new(PrincipalId::generate(), "Rebecca Adler", Role::Subject);
//!     ledger.register_principal(&doctor).await.unwrap();
//!     ledger.register_principal(&patient).await.unwrap();
//!
//!     let committed = ledger
//!         .create_record(
//!             &doctor,
//!             patient.id,
//!             RecordDraft::new("acute sinusitis", "amoxicillin 500mg"),
//!         )
//!         .await
//!         .unwrap();
//!     println!("block {} appended", committed.block.block_id);
//! }
//! ```

pub mod config;
pub mod error;
pub mod ledger;

// Re-export component crates
pub use medrec_consent as consent;
pub use medrec_core as core;
pub use medrec_store as store;
pub use medrec_vault as vault;

// Re-export main types for convenience
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use ledger::{CommittedRecord, Ledger, RecordDraft};

// Re-export commonly used component types
pub use medrec_consent::{Decision, DenialReason};
pub use medrec_core::{
    AccessLogEntry, ChainHash, ChainReport, ConsentDuration, ConsentRequestView, ConsentStatus,
    LedgerBlock, OpenRecord, Principal, PrincipalId, RecordId, RequestId, Role,
};
pub use medrec_vault::{VaultKey, DECRYPT_PLACEHOLDER};
