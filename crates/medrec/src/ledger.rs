//! The Ledger: unified API over vault, store, and consent.
//!
//! Write path: validate, encrypt sensitive fields, hash the canonical
//! record bytes, commit record and chain block as one transaction. Read
//! paths: the owner bypasses the gate and sees decrypt failures; any other
//! principal passes the consent gate and gets a placeholder for a field
//! that fails to decrypt.

use std::sync::Arc;

use tracing::{info, warn};

use medrec_consent::{ConsentGate, ConsentLedger, Decision};
use medrec_core::{
    canonical_record_bytes, validate_free_text, validate_name, verify_links, AccessLogEntry,
    ChainHash, ChainReport, ConsentDuration, ConsentRequestView, ConsentStatus, LedgerBlock,
    OpenRecord, Principal, PrincipalId, RecordId, RequestId, Role, SealedRecord,
};
use medrec_store::{Store, StoreError};
use medrec_vault::{Vault, DECRYPT_PLACEHOLDER};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};

/// Plaintext input for a new medical record.
#[derive(Debug, Clone, Default)]
pub struct RecordDraft {
    pub diagnosis: String,
    pub notes: String,
    pub attachment_ref: Option<String>,
}

impl RecordDraft {
    /// Create a draft with diagnosis and notes.
    pub fn new(diagnosis: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            diagnosis: diagnosis.into(),
            notes: notes.into(),
            attachment_ref: None,
        }
    }

    /// Attach an external file reference.
    pub fn with_attachment(mut self, attachment_ref: impl Into<String>) -> Self {
        self.attachment_ref = Some(attachment_ref.into());
        self
    }
}

/// Result of a committed record write: the record id and its chain block.
#[derive(Debug, Clone)]
pub struct CommittedRecord {
    pub record_id: RecordId,
    pub block: LedgerBlock,
}

/// The main ledger facade.
pub struct Ledger<S: Store> {
    store: Arc<S>,
    vault: Vault,
    consent: ConsentLedger<S>,
    gate: ConsentGate<S>,
}

impl<S: Store> Ledger<S> {
    /// Create a ledger over the given store and configuration.
    pub fn new(store: S, config: LedgerConfig) -> Self {
        let store = Arc::new(store);
        Self {
            vault: Vault::new(config.vault_key),
            consent: ConsentLedger::new(Arc::clone(&store)),
            gate: ConsentGate::new(Arc::clone(&store)),
            store,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Principals
    // ─────────────────────────────────────────────────────────────────────────

    /// Register (or refresh) a principal resolved by the authentication
    /// collaborator. Display names feed the read-side joins.
    pub async fn register_principal(&self, principal: &Principal) -> Result<()> {
        validate_name("name", &principal.name)?;
        self.store.upsert_principal(principal).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Records
    // ─────────────────────────────────────────────────────────────────────────

    /// Author a new record for a subject and append its chain block.
    ///
    /// The record row and the block row commit together or not at all; a
    /// record without a block is never visible to readers.
    pub async fn create_record(
        &self,
        author: &Principal,
        subject_id: PrincipalId,
        draft: RecordDraft,
    ) -> Result<CommittedRecord> {
        if author.role != Role::Requester {
            return Err(LedgerError::NotPermitted("only requesters may author records"));
        }
        validate_name("author_name", &author.name)?;
        validate_free_text("diagnosis", &draft.diagnosis)?;
        validate_free_text("notes", &draft.notes)?;

        let record = SealedRecord {
            id: RecordId::generate(),
            subject_id,
            author_name: author.name.clone(),
            diagnosis: self.vault.encrypt(&draft.diagnosis)?,
            notes: self.vault.encrypt(&draft.notes)?,
            attachment_ref: draft.attachment_ref,
            created_at: now_millis(),
        };
        let data_hash = ChainHash::digest(&canonical_record_bytes(&record));

        let block = self
            .store
            .insert_record_with_block(&record, &data_hash)
            .await
            .map_err(|e| match e {
                StoreError::ChainIntegrity(msg) => LedgerError::ChainIntegrity(msg),
                other => LedgerError::Store(other),
            })?;

        info!(record = %record.id, block = block.block_id, "record committed to chain");
        Ok(CommittedRecord {
            record_id: record.id,
            block,
        })
    }

    /// A subject reads their own records. No gate; a field that fails to
    /// decrypt surfaces the error so the data owner sees real failures.
    pub async fn records_for_owner(&self, owner: &Principal) -> Result<Vec<OpenRecord>> {
        let sealed = self.store.records_for_subject(&owner.id).await?;
        let mut records = Vec::with_capacity(sealed.len());
        for record in sealed {
            let diagnosis = self.vault.decrypt(&record.diagnosis)?;
            let notes = self.vault.decrypt(&record.notes)?;
            records.push(record.opened(diagnosis, notes));
        }
        Ok(records)
    }

    /// A requester reads another principal's records, through the gate.
    ///
    /// A field that fails to decrypt is replaced with
    /// [`DECRYPT_PLACEHOLDER`] rather than failing the whole read; one
    /// corrupt field must not block the rest of the chart.
    pub async fn records_for_requester(
        &self,
        requester: &Principal,
        subject_id: PrincipalId,
    ) -> Result<Vec<OpenRecord>> {
        match self.gate.check(requester.id, subject_id).await? {
            Decision::Allowed => {}
            Decision::Denied(reason) => {
                return Err(LedgerError::AuthorizationDenied { reason })
            }
        }

        let sealed = self.store.records_for_subject(&subject_id).await?;
        Ok(sealed
            .into_iter()
            .map(|record| {
                let diagnosis = self.open_or_placeholder(record.id, "diagnosis", &record.diagnosis);
                let notes = self.open_or_placeholder(record.id, "notes", &record.notes);
                record.opened(diagnosis, notes)
            })
            .collect())
    }

    fn open_or_placeholder(&self, record_id: RecordId, field: &str, envelope: &str) -> String {
        match self.vault.decrypt(envelope) {
            Ok(plaintext) => plaintext,
            Err(err) => {
                warn!(record = %record_id, field, %err, "field failed to decrypt, substituting placeholder");
                DECRYPT_PLACEHOLDER.to_string()
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Consent
    // ─────────────────────────────────────────────────────────────────────────

    /// A requester asks a subject for access.
    pub async fn request_consent(
        &self,
        requester: &Principal,
        subject_id: PrincipalId,
    ) -> Result<RequestId> {
        if requester.role != Role::Requester {
            return Err(LedgerError::NotPermitted("only requesters may ask for access"));
        }
        Ok(self.consent.create_request(requester.id, subject_id).await?)
    }

    /// The subject grants a pending request.
    pub async fn grant_consent(
        &self,
        subject: &Principal,
        request_id: RequestId,
        duration: ConsentDuration,
        data_scope: &str,
    ) -> Result<()> {
        if subject.role != Role::Subject {
            return Err(LedgerError::NotPermitted("only subjects may decide on consent"));
        }
        Ok(self
            .consent
            .grant(request_id, subject.id, duration, data_scope)
            .await?)
    }

    /// The subject denies a pending request.
    pub async fn deny_consent(&self, subject: &Principal, request_id: RequestId) -> Result<()> {
        if subject.role != Role::Subject {
            return Err(LedgerError::NotPermitted("only subjects may decide on consent"));
        }
        Ok(self.consent.deny(request_id, subject.id).await?)
    }

    /// The subject revokes a granted request.
    pub async fn revoke_consent(&self, subject: &Principal, request_id: RequestId) -> Result<()> {
        if subject.role != Role::Subject {
            return Err(LedgerError::NotPermitted("only subjects may decide on consent"));
        }
        Ok(self.consent.revoke(request_id, subject.id).await?)
    }

    /// All consent requests addressed to the subject, newest first.
    pub async fn consent_requests_for(
        &self,
        subject: &Principal,
    ) -> Result<Vec<ConsentRequestView>> {
        Ok(self.consent.list_for_subject(subject.id).await?)
    }

    /// Status of the newest request between a requester and a subject.
    pub async fn consent_status(
        &self,
        requester: &Principal,
        subject_id: PrincipalId,
    ) -> Result<Option<ConsentStatus>> {
        Ok(self.consent.current_status(requester.id, subject_id).await?)
    }

    /// May the requester read the subject's records right now?
    pub async fn authorize(
        &self,
        requester_id: PrincipalId,
        subject_id: PrincipalId,
    ) -> Result<bool> {
        Ok(self.gate.authorize(requester_id, subject_id).await?)
    }

    /// [`Ledger::authorize`] with an injected clock, for tests.
    pub async fn authorize_at(
        &self,
        requester_id: PrincipalId,
        subject_id: PrincipalId,
        now: i64,
    ) -> Result<bool> {
        Ok(self.gate.authorize_at(requester_id, subject_id, now).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Chain and audit
    // ─────────────────────────────────────────────────────────────────────────

    /// All chain blocks, newest first.
    pub async fn chain(&self) -> Result<Vec<LedgerBlock>> {
        Ok(self.store.chain_blocks().await?)
    }

    /// Verify the whole chain: link structure plus a recomputation of every
    /// block's digest from its record's canonical bytes.
    pub async fn verify_chain(&self) -> Result<ChainReport> {
        let mut blocks = self.store.chain_blocks().await?;
        blocks.reverse(); // oldest first

        let report = verify_links(&blocks);
        if !report.is_intact() {
            return Ok(report);
        }

        for block in &blocks {
            match self.store.get_record(&block.record_id).await? {
                None => {
                    return Ok(ChainReport::MissingRecord {
                        block_id: block.block_id,
                        record_id: block.record_id,
                    })
                }
                Some(record) => {
                    let expected = ChainHash::digest(&canonical_record_bytes(&record));
                    if expected != block.data_hash {
                        return Ok(ChainReport::HashMismatch {
                            block_id: block.block_id,
                            record_id: block.record_id,
                        });
                    }
                }
            }
        }

        Ok(report)
    }

    /// The subject's access log: who touched their data and when.
    pub async fn access_log(&self, subject: &Principal) -> Result<Vec<AccessLogEntry>> {
        Ok(self.store.access_log_for_subject(&subject.id).await?)
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
