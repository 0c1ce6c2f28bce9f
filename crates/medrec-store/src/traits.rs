//! Store trait: the abstract interface for ledger persistence.
//!
//! This trait keeps the rest of the system storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests). Both must satisfy the
//! same atomicity contract; the trait documents it, the integration tests
//! enforce it against both backends.

use async_trait::async_trait;

use medrec_core::{
    AccessLogEntry, ChainHash, ConsentDuration, ConsentRequest, ConsentRequestView, ConsentStatus,
    LedgerBlock, Principal, PrincipalId, RecordId, RequestId, SealedRecord,
};

use crate::error::Result;

/// The Store trait: async interface for ledger persistence.
///
/// All methods are short and synchronous at the storage layer; SQLite work
/// runs under `spawn_blocking` so callers never block the async runtime.
///
/// # Atomicity contract
///
/// - `insert_record_with_block` is one serialized transaction: read newest
///   hash, insert record, insert block. No two concurrent calls may observe
///   the same predecessor hash.
/// - `grant_consent` / `deny_consent` / `revoke_consent` are single
///   conditional updates returning the affected row count; 0 means "absent,
///   not owned by that subject, or not in the required state" and the caller
///   must not treat it as success.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Principals
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or update a principal (display name source for read-side joins).
    async fn upsert_principal(&self, principal: &Principal) -> Result<()>;

    /// Fetch a principal by id.
    async fn get_principal(&self, id: &PrincipalId) -> Result<Option<Principal>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Records and chain
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a sealed record and append its ledger block atomically.
    ///
    /// Reads the newest block's `data_hash` (the genesis sentinel if the
    /// chain is empty), inserts the record row and the block row in the same
    /// transaction, and returns the new block. Failure of either insert
    /// rolls back both.
    async fn insert_record_with_block(
        &self,
        record: &SealedRecord,
        data_hash: &ChainHash,
    ) -> Result<LedgerBlock>;

    /// Fetch a record by id.
    async fn get_record(&self, id: &RecordId) -> Result<Option<SealedRecord>>;

    /// All records for a subject, newest first.
    async fn records_for_subject(&self, subject_id: &PrincipalId) -> Result<Vec<SealedRecord>>;

    /// All chain blocks, newest first.
    async fn chain_blocks(&self) -> Result<Vec<LedgerBlock>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Consent
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a new (pending) consent request.
    async fn insert_consent_request(&self, request: &ConsentRequest) -> Result<()>;

    /// Fetch a consent request by id.
    async fn get_consent_request(&self, id: &RequestId) -> Result<Option<ConsentRequest>>;

    /// All requests addressed to a subject, newest first, with display names.
    async fn consent_requests_for_subject(
        &self,
        subject_id: &PrincipalId,
    ) -> Result<Vec<ConsentRequestView>>;

    /// Conditionally move a pending request to granted, recording duration,
    /// scope, and expiry. Guard: row exists, belongs to `subject_id`, status
    /// is pending. Returns affected row count (0 or 1).
    async fn grant_consent(
        &self,
        id: &RequestId,
        subject_id: &PrincipalId,
        duration: ConsentDuration,
        data_scope: &str,
        expires_at: Option<i64>,
        now: i64,
    ) -> Result<u64>;

    /// Conditionally move a pending request to denied. Same guard shape as
    /// `grant_consent`.
    async fn deny_consent(&self, id: &RequestId, subject_id: &PrincipalId, now: i64)
        -> Result<u64>;

    /// Conditionally move a granted request to revoked. Succeeds on a
    /// nominally granted row even past its expiry.
    async fn revoke_consent(
        &self,
        id: &RequestId,
        subject_id: &PrincipalId,
        now: i64,
    ) -> Result<u64>;

    /// The newest granted request for a (requester, subject) pair, if any.
    ///
    /// This is the consent gate's read: rows in other states for the same
    /// pair are irrelevant. Expiry is the caller's predicate to evaluate.
    async fn granted_request(
        &self,
        requester_id: &PrincipalId,
        subject_id: &PrincipalId,
    ) -> Result<Option<ConsentRequest>>;

    /// Status of the newest request for a pair, regardless of state.
    /// Presentation only.
    async fn latest_request_status(
        &self,
        requester_id: &PrincipalId,
        subject_id: &PrincipalId,
    ) -> Result<Option<ConsentStatus>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Audit
    // ─────────────────────────────────────────────────────────────────────────

    /// The subject-facing access log: record creations and consent requests
    /// for the subject, unioned, newest first.
    async fn access_log_for_subject(
        &self,
        subject_id: &PrincipalId,
    ) -> Result<Vec<AccessLogEntry>>;
}
