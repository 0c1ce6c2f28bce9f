//! In-memory implementation of the Store trait.
//!
//! Primarily for testing. Same semantics as the SQLite backend, including
//! the atomicity contract: the write lock serializes every mutation, so the
//! read-of-previous and write-of-next of a chain append are one critical
//! section.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use medrec_core::{
    AccessAction, AccessLogEntry, ChainHash, ConsentDuration, ConsentRequest, ConsentRequestView,
    ConsentStatus, LedgerBlock, Principal, PrincipalId, RecordId, RequestId, SealedRecord,
};

use crate::error::{Result, StoreError};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    principals: HashMap<PrincipalId, Principal>,

    records: HashMap<RecordId, SealedRecord>,
    /// Insertion order, for newest-first tie-breaking.
    record_order: Vec<RecordId>,

    requests: HashMap<RequestId, ConsentRequest>,
    request_order: Vec<RequestId>,

    blocks: Vec<LedgerBlock>,
    next_block_id: i64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                next_block_id: 1,
                ..Default::default()
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort key matching the SQL `ORDER BY created_at DESC, rowid DESC`.
fn newest_first<T>(mut items: Vec<(usize, i64, T)>) -> Vec<T> {
    items.sort_by(|a, b| (b.1, b.0).cmp(&(a.1, a.0)));
    items.into_iter().map(|(_, _, item)| item).collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_principal(&self, principal: &Principal) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.principals.insert(principal.id, principal.clone());
        Ok(())
    }

    async fn get_principal(&self, id: &PrincipalId) -> Result<Option<Principal>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.principals.get(id).cloned())
    }

    async fn insert_record_with_block(
        &self,
        record: &SealedRecord,
        data_hash: &ChainHash,
    ) -> Result<LedgerBlock> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        if inner.records.contains_key(&record.id) {
            return Err(StoreError::InvalidData(format!(
                "duplicate record id: {}",
                record.id
            )));
        }

        let previous_hash = inner
            .blocks
            .last()
            .map(|b| b.data_hash)
            .unwrap_or(ChainHash::GENESIS);

        // Mirrors the UNIQUE(previous_hash) backstop of the SQLite schema.
        if inner.blocks.iter().any(|b| b.previous_hash == previous_hash) {
            return Err(StoreError::ChainIntegrity(format!(
                "previous hash {} already consumed",
                previous_hash
            )));
        }

        let block = LedgerBlock {
            block_id: inner.next_block_id,
            record_id: record.id,
            data_hash: *data_hash,
            previous_hash,
            created_at: now_millis(),
        };

        inner.next_block_id += 1;
        inner.records.insert(record.id, record.clone());
        inner.record_order.push(record.id);
        inner.blocks.push(block.clone());

        Ok(block)
    }

    async fn get_record(&self, id: &RecordId) -> Result<Option<SealedRecord>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.records.get(id).cloned())
    }

    async fn records_for_subject(&self, subject_id: &PrincipalId) -> Result<Vec<SealedRecord>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let items = inner
            .record_order
            .iter()
            .enumerate()
            .filter_map(|(idx, id)| inner.records.get(id).map(|r| (idx, r)))
            .filter(|(_, r)| r.subject_id == *subject_id)
            .map(|(idx, r)| (idx, r.created_at, r.clone()))
            .collect();
        Ok(newest_first(items))
    }

    async fn chain_blocks(&self) -> Result<Vec<LedgerBlock>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.blocks.iter().rev().cloned().collect())
    }

    async fn insert_consent_request(&self, request: &ConsentRequest) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if inner.requests.contains_key(&request.id) {
            return Err(StoreError::InvalidData(format!(
                "duplicate request id: {}",
                request.id
            )));
        }
        inner.requests.insert(request.id, request.clone());
        inner.request_order.push(request.id);
        Ok(())
    }

    async fn get_consent_request(&self, id: &RequestId) -> Result<Option<ConsentRequest>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.requests.get(id).cloned())
    }

    async fn consent_requests_for_subject(
        &self,
        subject_id: &PrincipalId,
    ) -> Result<Vec<ConsentRequestView>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let name_of = |id: &PrincipalId| {
            inner
                .principals
                .get(id)
                .map(|p| p.name.clone())
                .unwrap_or_default()
        };
        let items = inner
            .request_order
            .iter()
            .enumerate()
            .filter_map(|(idx, id)| inner.requests.get(id).map(|r| (idx, r)))
            .filter(|(_, r)| r.subject_id == *subject_id)
            .map(|(idx, r)| {
                (
                    idx,
                    r.created_at,
                    ConsentRequestView {
                        requester_name: name_of(&r.requester_id),
                        subject_name: name_of(&r.subject_id),
                        request: r.clone(),
                    },
                )
            })
            .collect();
        Ok(newest_first(items))
    }

    async fn grant_consent(
        &self,
        id: &RequestId,
        subject_id: &PrincipalId,
        duration: ConsentDuration,
        data_scope: &str,
        expires_at: Option<i64>,
        now: i64,
    ) -> Result<u64> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        match inner.requests.get_mut(id) {
            Some(req)
                if req.subject_id == *subject_id && req.status == ConsentStatus::Pending =>
            {
                req.status = ConsentStatus::Granted;
                req.duration = Some(duration);
                req.data_scope = Some(data_scope.to_string());
                req.expires_at = expires_at;
                req.updated_at = now;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn deny_consent(
        &self,
        id: &RequestId,
        subject_id: &PrincipalId,
        now: i64,
    ) -> Result<u64> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        match inner.requests.get_mut(id) {
            Some(req)
                if req.subject_id == *subject_id && req.status == ConsentStatus::Pending =>
            {
                req.status = ConsentStatus::Denied;
                req.updated_at = now;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn revoke_consent(
        &self,
        id: &RequestId,
        subject_id: &PrincipalId,
        now: i64,
    ) -> Result<u64> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        match inner.requests.get_mut(id) {
            Some(req)
                if req.subject_id == *subject_id && req.status == ConsentStatus::Granted =>
            {
                req.status = ConsentStatus::Revoked;
                req.updated_at = now;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn granted_request(
        &self,
        requester_id: &PrincipalId,
        subject_id: &PrincipalId,
    ) -> Result<Option<ConsentRequest>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let newest = inner
            .request_order
            .iter()
            .enumerate()
            .filter_map(|(idx, id)| inner.requests.get(id).map(|r| (idx, r)))
            .filter(|(_, r)| {
                r.requester_id == *requester_id
                    && r.subject_id == *subject_id
                    && r.status == ConsentStatus::Granted
            })
            .max_by_key(|(idx, r)| (r.created_at, *idx))
            .map(|(_, r)| r.clone());
        Ok(newest)
    }

    async fn latest_request_status(
        &self,
        requester_id: &PrincipalId,
        subject_id: &PrincipalId,
    ) -> Result<Option<ConsentStatus>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let newest = inner
            .request_order
            .iter()
            .enumerate()
            .filter_map(|(idx, id)| inner.requests.get(id).map(|r| (idx, r)))
            .filter(|(_, r)| r.requester_id == *requester_id && r.subject_id == *subject_id)
            .max_by_key(|(idx, r)| (r.created_at, *idx))
            .map(|(_, r)| r.status);
        Ok(newest)
    }

    async fn access_log_for_subject(
        &self,
        subject_id: &PrincipalId,
    ) -> Result<Vec<AccessLogEntry>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;

        let mut items: Vec<(usize, i64, AccessLogEntry)> = Vec::new();

        for (idx, id) in inner.record_order.iter().enumerate() {
            let Some(record) = inner.records.get(id) else {
                continue;
            };
            if record.subject_id != *subject_id {
                continue;
            }
            items.push((
                idx,
                record.created_at,
                AccessLogEntry {
                    actor_name: record.author_name.clone(),
                    action: AccessAction::CreatedRecord,
                    detail: record.id.to_hex(),
                    timestamp: record.created_at,
                    status: "verified".to_string(),
                },
            ));
        }

        for (idx, id) in inner.request_order.iter().enumerate() {
            let Some(req) = inner.requests.get(id) else {
                continue;
            };
            if req.subject_id != *subject_id {
                continue;
            }
            let actor_name = inner
                .principals
                .get(&req.requester_id)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            items.push((
                idx,
                req.created_at,
                AccessLogEntry {
                    actor_name,
                    action: AccessAction::RequestedConsent,
                    detail: req.data_scope.clone().unwrap_or_default(),
                    timestamp: req.created_at,
                    status: req.status.as_str().to_string(),
                },
            ));
        }

        Ok(newest_first(items))
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
