//! SQLite implementation of the Store trait.
//!
//! The primary storage backend. Uses rusqlite with bundled SQLite behind a
//! single mutex-guarded connection, wrapped in async via
//! `tokio::task::spawn_blocking`. The single connection is what serializes
//! chain appends: the read-of-previous and the write-of-next always happen
//! inside one transaction while holding the mutex.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use medrec_core::{
    AccessAction, AccessLogEntry, ChainHash, ConsentDuration, ConsentRequest, ConsentRequestView,
    ConsentStatus, LedgerBlock, Principal, PrincipalId, RecordId, RequestId, Role, SealedRecord,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via an internal mutex; every operation runs on the blocking
/// pool so the async runtime is never stalled by disk I/O.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database. Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Runtime(e.to_string()))?
    }
}

/// Wrap a domain decode failure so it can cross a rusqlite row closure.
fn decode_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SealedRecord> {
    let id: String = row.get("record_id")?;
    let subject_id: String = row.get("subject_id")?;
    Ok(SealedRecord {
        id: RecordId::from_hex(&id).map_err(|e| decode_err(0, e))?,
        subject_id: PrincipalId::from_hex(&subject_id).map_err(|e| decode_err(1, e))?,
        author_name: row.get("author_name")?,
        diagnosis: row.get("diagnosis")?,
        notes: row.get("notes")?,
        attachment_ref: row.get("attachment_ref")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_request(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConsentRequest> {
    let id: String = row.get("request_id")?;
    let requester_id: String = row.get("requester_id")?;
    let subject_id: String = row.get("subject_id")?;
    let status: String = row.get("status")?;
    let duration: Option<String> = row.get("duration")?;
    Ok(ConsentRequest {
        id: RequestId::from_hex(&id).map_err(|e| decode_err(0, e))?,
        requester_id: PrincipalId::from_hex(&requester_id).map_err(|e| decode_err(1, e))?,
        subject_id: PrincipalId::from_hex(&subject_id).map_err(|e| decode_err(2, e))?,
        status: ConsentStatus::parse(&status).map_err(|e| decode_err(3, e))?,
        duration: duration
            .map(|d| ConsentDuration::parse(&d).map_err(|e| decode_err(4, e)))
            .transpose()?,
        data_scope: row.get("data_scope")?,
        expires_at: row.get("expires_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_block(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerBlock> {
    let record_id: String = row.get("record_id")?;
    let data_hash: String = row.get("data_hash")?;
    let previous_hash: String = row.get("previous_hash")?;
    Ok(LedgerBlock {
        block_id: row.get("block_id")?,
        record_id: RecordId::from_hex(&record_id).map_err(|e| decode_err(1, e))?,
        data_hash: ChainHash::from_hex(&data_hash).map_err(|e| decode_err(2, e))?,
        previous_hash: ChainHash::from_hex(&previous_hash).map_err(|e| decode_err(3, e))?,
        created_at: row.get("created_at")?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_principal(&self, principal: &Principal) -> Result<()> {
        let principal = principal.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO principals (principal_id, name, role, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(principal_id) DO UPDATE SET
                     name = excluded.name,
                     role = excluded.role",
                params![
                    principal.id.to_hex(),
                    principal.name,
                    principal.role.as_str(),
                    now_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_principal(&self, id: &PrincipalId) -> Result<Option<Principal>> {
        let id = *id;
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT principal_id, name, role FROM principals WHERE principal_id = ?1",
                params![id.to_hex()],
                |row| {
                    let pid: String = row.get(0)?;
                    let role: String = row.get(2)?;
                    Ok(Principal {
                        id: PrincipalId::from_hex(&pid).map_err(|e| decode_err(0, e))?,
                        name: row.get(1)?,
                        role: Role::parse(&role).map_err(|e| decode_err(2, e))?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn insert_record_with_block(
        &self,
        record: &SealedRecord,
        data_hash: &ChainHash,
    ) -> Result<LedgerBlock> {
        let record = record.clone();
        let data_hash = *data_hash;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let prev: Option<String> = tx
                .query_row(
                    "SELECT data_hash FROM ledger_blocks ORDER BY block_id DESC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            let previous_hash = match prev {
                Some(h) => ChainHash::from_hex(&h)
                    .map_err(|e| StoreError::InvalidData(e.to_string()))?,
                None => ChainHash::GENESIS,
            };

            tx.execute(
                "INSERT INTO medical_records (
                    record_id, subject_id, author_name, diagnosis, notes,
                    attachment_ref, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id.to_hex(),
                    record.subject_id.to_hex(),
                    record.author_name,
                    record.diagnosis,
                    record.notes,
                    record.attachment_ref,
                    record.created_at,
                ],
            )?;

            let now = now_millis();
            tx.execute(
                "INSERT INTO ledger_blocks (record_id, data_hash, previous_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id.to_hex(),
                    data_hash.to_hex(),
                    previous_hash.to_hex(),
                    now,
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::ChainIntegrity(format!(
                        "previous hash {} already consumed",
                        previous_hash
                    ))
                }
                other => StoreError::Database(other),
            })?;
            let block_id = tx.last_insert_rowid();

            tx.commit()?;

            debug!(record = %record.id, block_id, "record and block committed");
            Ok(LedgerBlock {
                block_id,
                record_id: record.id,
                data_hash,
                previous_hash,
                created_at: now,
            })
        })
        .await
    }

    async fn get_record(&self, id: &RecordId) -> Result<Option<SealedRecord>> {
        let id = *id;
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT record_id, subject_id, author_name, diagnosis, notes,
                        attachment_ref, created_at
                 FROM medical_records WHERE record_id = ?1",
                params![id.to_hex()],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn records_for_subject(&self, subject_id: &PrincipalId) -> Result<Vec<SealedRecord>> {
        let subject_id = *subject_id;
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT record_id, subject_id, author_name, diagnosis, notes,
                        attachment_ref, created_at
                 FROM medical_records WHERE subject_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let records = stmt
                .query_map(params![subject_id.to_hex()], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    async fn chain_blocks(&self) -> Result<Vec<LedgerBlock>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT block_id, record_id, data_hash, previous_hash, created_at
                 FROM ledger_blocks ORDER BY block_id DESC",
            )?;
            let blocks = stmt
                .query_map([], row_to_block)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(blocks)
        })
        .await
    }

    async fn insert_consent_request(&self, request: &ConsentRequest) -> Result<()> {
        let request = request.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO consent_requests (
                    request_id, requester_id, subject_id, status, duration,
                    data_scope, expires_at, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    request.id.to_hex(),
                    request.requester_id.to_hex(),
                    request.subject_id.to_hex(),
                    request.status.as_str(),
                    request.duration.map(|d| d.as_str()),
                    request.data_scope,
                    request.expires_at,
                    request.created_at,
                    request.updated_at,
                ],
            )?;
            debug!(request = %request.id, "consent request inserted");
            Ok(())
        })
        .await
    }

    async fn get_consent_request(&self, id: &RequestId) -> Result<Option<ConsentRequest>> {
        let id = *id;
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT request_id, requester_id, subject_id, status, duration,
                        data_scope, expires_at, created_at, updated_at
                 FROM consent_requests WHERE request_id = ?1",
                params![id.to_hex()],
                row_to_request,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn consent_requests_for_subject(
        &self,
        subject_id: &PrincipalId,
    ) -> Result<Vec<ConsentRequestView>> {
        let subject_id = *subject_id;
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT cr.request_id, cr.requester_id, cr.subject_id, cr.status,
                        cr.duration, cr.data_scope, cr.expires_at, cr.created_at,
                        cr.updated_at,
                        r.name AS requester_name, s.name AS subject_name
                 FROM consent_requests cr
                 JOIN principals r ON cr.requester_id = r.principal_id
                 JOIN principals s ON cr.subject_id = s.principal_id
                 WHERE cr.subject_id = ?1
                 ORDER BY cr.created_at DESC, cr.rowid DESC",
            )?;
            let views = stmt
                .query_map(params![subject_id.to_hex()], |row| {
                    Ok(ConsentRequestView {
                        request: row_to_request(row)?,
                        requester_name: row.get("requester_name")?,
                        subject_name: row.get("subject_name")?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(views)
        })
        .await
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
        let id = *id;
        let subject_id = *subject_id;
        let data_scope = data_scope.to_string();
        self.with_conn(move |conn| {
            // Guard and write are one statement: two concurrent decisions on
            // the same request cannot both see 'pending'.
            let rows = conn.execute(
                "UPDATE consent_requests
                 SET status = 'granted',
                     duration = ?3,
                     data_scope = ?4,
                     expires_at = ?5,
                     updated_at = ?6
                 WHERE request_id = ?1 AND subject_id = ?2 AND status = 'pending'",
                params![
                    id.to_hex(),
                    subject_id.to_hex(),
                    duration.as_str(),
                    data_scope,
                    expires_at,
                    now,
                ],
            )?;
            debug!(request = %id, rows, "grant applied");
            Ok(rows as u64)
        })
        .await
    }

    async fn deny_consent(
        &self,
        id: &RequestId,
        subject_id: &PrincipalId,
        now: i64,
    ) -> Result<u64> {
        let id = *id;
        let subject_id = *subject_id;
        self.with_conn(move |conn| {
            let rows = conn.execute(
                "UPDATE consent_requests
                 SET status = 'denied', updated_at = ?3
                 WHERE request_id = ?1 AND subject_id = ?2 AND status = 'pending'",
                params![id.to_hex(), subject_id.to_hex(), now],
            )?;
            debug!(request = %id, rows, "deny applied");
            Ok(rows as u64)
        })
        .await
    }

    async fn revoke_consent(
        &self,
        id: &RequestId,
        subject_id: &PrincipalId,
        now: i64,
    ) -> Result<u64> {
        let id = *id;
        let subject_id = *subject_id;
        self.with_conn(move |conn| {
            let rows = conn.execute(
                "UPDATE consent_requests
                 SET status = 'revoked', updated_at = ?3
                 WHERE request_id = ?1 AND subject_id = ?2 AND status = 'granted'",
                params![id.to_hex(), subject_id.to_hex(), now],
            )?;
            debug!(request = %id, rows, "revoke applied");
            Ok(rows as u64)
        })
        .await
    }

    async fn granted_request(
        &self,
        requester_id: &PrincipalId,
        subject_id: &PrincipalId,
    ) -> Result<Option<ConsentRequest>> {
        let requester_id = *requester_id;
        let subject_id = *subject_id;
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT request_id, requester_id, subject_id, status, duration,
                        data_scope, expires_at, created_at, updated_at
                 FROM consent_requests
                 WHERE requester_id = ?1 AND subject_id = ?2 AND status = 'granted'
                 ORDER BY created_at DESC, rowid DESC LIMIT 1",
                params![requester_id.to_hex(), subject_id.to_hex()],
                row_to_request,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn latest_request_status(
        &self,
        requester_id: &PrincipalId,
        subject_id: &PrincipalId,
    ) -> Result<Option<ConsentStatus>> {
        let requester_id = *requester_id;
        let subject_id = *subject_id;
        self.with_conn(move |conn| {
            let status: Option<String> = conn
                .query_row(
                    "SELECT status FROM consent_requests
                     WHERE requester_id = ?1 AND subject_id = ?2
                     ORDER BY created_at DESC, rowid DESC LIMIT 1",
                    params![requester_id.to_hex(), subject_id.to_hex()],
                    |row| row.get(0),
                )
                .optional()?;
            status
                .map(|s| {
                    ConsentStatus::parse(&s).map_err(|e| StoreError::InvalidData(e.to_string()))
                })
                .transpose()
        })
        .await
    }

    async fn access_log_for_subject(
        &self,
        subject_id: &PrincipalId,
    ) -> Result<Vec<AccessLogEntry>> {
        let subject_id = *subject_id;
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT mr.author_name AS actor_name,
                        'created_record' AS action,
                        mr.record_id AS detail,
                        mr.created_at AS ts,
                        'verified' AS status
                 FROM medical_records mr
                 WHERE mr.subject_id = ?1
                 UNION ALL
                 SELECT p.name, 'requested_consent', COALESCE(cr.data_scope, ''),
                        cr.created_at, cr.status
                 FROM consent_requests cr
                 JOIN principals p ON cr.requester_id = p.principal_id
                 WHERE cr.subject_id = ?1
                 ORDER BY ts DESC",
            )?;
            let entries = stmt
                .query_map(params![subject_id.to_hex()], |row| {
                    let action: String = row.get("action")?;
                    Ok(AccessLogEntry {
                        actor_name: row.get("actor_name")?,
                        action: if action == "created_record" {
                            AccessAction::CreatedRecord
                        } else {
                            AccessAction::RequestedConsent
                        },
                        detail: row.get("detail")?,
                        timestamp: row.get("ts")?,
                        status: row.get("status")?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
        .await
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

#[cfg(test)]
mod tests {
    use super::*;
    use medrec_core::canonical_record_bytes;

    fn principal(byte: u8, name: &str, role: Role) -> Principal {
        Principal::new(PrincipalId::from_bytes([byte; 16]), name, role)
    }

    fn record(subject: &Principal, seq: u8) -> SealedRecord {
        SealedRecord {
            id: RecordId::from_bytes([seq; 16]),
            subject_id: subject.id,
            author_name: "dr. Chase".to_string(),
            diagnosis: format!("envelope-{}", seq),
            notes: format!("notes-{}", seq),
            attachment_ref: None,
            created_at: 1_000 + seq as i64,
        }
    }

    async fn seeded_store() -> (SqliteStore, Principal, Principal) {
        let store = SqliteStore::open_memory().unwrap();
        let requester = principal(0xd0, "dr. Chase", Role::Requester);
        let subject = principal(0x9a, "Rebecca Adler", Role::Subject);
        store.upsert_principal(&requester).await.unwrap();
        store.upsert_principal(&subject).await.unwrap();
        (store, requester, subject)
    }

    #[tokio::test]
    async fn test_first_block_links_to_genesis() {
        let (store, _, subject) = seeded_store().await;
        let rec = record(&subject, 1);
        let hash = ChainHash::digest(&canonical_record_bytes(&rec));

        let block = store.insert_record_with_block(&rec, &hash).await.unwrap();
        assert_eq!(block.previous_hash, ChainHash::GENESIS);
        assert_eq!(block.data_hash, hash);
        assert_eq!(block.record_id, rec.id);

        let fetched = store.get_record(&rec.id).await.unwrap().unwrap();
        assert_eq!(fetched, rec);
    }

    #[tokio::test]
    async fn test_second_block_links_to_first() {
        let (store, _, subject) = seeded_store().await;
        let r1 = record(&subject, 1);
        let r2 = record(&subject, 2);
        let h1 = ChainHash::digest(&canonical_record_bytes(&r1));
        let h2 = ChainHash::digest(&canonical_record_bytes(&r2));

        let b1 = store.insert_record_with_block(&r1, &h1).await.unwrap();
        let b2 = store.insert_record_with_block(&r2, &h2).await.unwrap();

        assert_eq!(b2.previous_hash, b1.data_hash);
        assert!(b2.block_id > b1.block_id);

        // Newest first.
        let chain = store.chain_blocks().await.unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].block_id, b2.block_id);
    }

    #[tokio::test]
    async fn test_grant_requires_pending_and_owner() {
        let (store, requester, subject) = seeded_store().await;
        let req = ConsentRequest::new(RequestId::generate(), requester.id, subject.id, 1_000);
        store.insert_consent_request(&req).await.unwrap();

        // Wrong subject: no rows.
        let stranger = PrincipalId::from_bytes([0xee; 16]);
        let rows = store
            .grant_consent(&req.id, &stranger, ConsentDuration::Permanent, "all", None, 2_000)
            .await
            .unwrap();
        assert_eq!(rows, 0);

        // Owner grants: one row.
        let rows = store
            .grant_consent(
                &req.id,
                &subject.id,
                ConsentDuration::TwentyFourHours,
                "all",
                Some(3_000),
                2_000,
            )
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let stored = store.get_consent_request(&req.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ConsentStatus::Granted);
        assert_eq!(stored.duration, Some(ConsentDuration::TwentyFourHours));
        assert_eq!(stored.expires_at, Some(3_000));
        assert_eq!(stored.data_scope.as_deref(), Some("all"));

        // Granting again: no longer pending, no rows.
        let rows = store
            .grant_consent(&req.id, &subject.id, ConsentDuration::Permanent, "all", None, 4_000)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_deny_and_revoke_guards() {
        let (store, requester, subject) = seeded_store().await;
        let req = ConsentRequest::new(RequestId::generate(), requester.id, subject.id, 1_000);
        store.insert_consent_request(&req).await.unwrap();

        // Revoke before grant: not in 'granted', no rows.
        assert_eq!(
            store.revoke_consent(&req.id, &subject.id, 2_000).await.unwrap(),
            0
        );

        // Deny from pending works once.
        assert_eq!(
            store.deny_consent(&req.id, &subject.id, 2_000).await.unwrap(),
            1
        );
        assert_eq!(
            store.deny_consent(&req.id, &subject.id, 3_000).await.unwrap(),
            0
        );

        // Denied can never be granted.
        let rows = store
            .grant_consent(&req.id, &subject.id, ConsentDuration::Permanent, "all", None, 4_000)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_revoke_succeeds_past_expiry() {
        let (store, requester, subject) = seeded_store().await;
        let req = ConsentRequest::new(RequestId::generate(), requester.id, subject.id, 1_000);
        store.insert_consent_request(&req).await.unwrap();
        store
            .grant_consent(
                &req.id,
                &subject.id,
                ConsentDuration::TwentyFourHours,
                "all",
                Some(2_000),
                1_500,
            )
            .await
            .unwrap();

        // Expiry has passed, but the row is still nominally granted.
        assert_eq!(
            store.revoke_consent(&req.id, &subject.id, 10_000).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_granted_request_ignores_other_rows() {
        let (store, requester, subject) = seeded_store().await;

        // A denied and a pending request exist alongside the granted one.
        let denied = ConsentRequest::new(RequestId::generate(), requester.id, subject.id, 100);
        store.insert_consent_request(&denied).await.unwrap();
        store.deny_consent(&denied.id, &subject.id, 150).await.unwrap();

        let granted = ConsentRequest::new(RequestId::generate(), requester.id, subject.id, 200);
        store.insert_consent_request(&granted).await.unwrap();
        store
            .grant_consent(&granted.id, &subject.id, ConsentDuration::Permanent, "all", None, 250)
            .await
            .unwrap();

        let pending = ConsentRequest::new(RequestId::generate(), requester.id, subject.id, 300);
        store.insert_consent_request(&pending).await.unwrap();

        let found = store
            .granted_request(&requester.id, &subject.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, granted.id);

        // But the newest request overall is the pending one.
        assert_eq!(
            store
                .latest_request_status(&requester.id, &subject.id)
                .await
                .unwrap(),
            Some(ConsentStatus::Pending)
        );
    }

    #[tokio::test]
    async fn test_latest_status_none_without_requests() {
        let (store, requester, subject) = seeded_store().await;
        assert_eq!(
            store
                .latest_request_status(&requester.id, &subject.id)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_requests_for_subject_joins_names() {
        let (store, requester, subject) = seeded_store().await;
        let older = ConsentRequest::new(RequestId::generate(), requester.id, subject.id, 100);
        let newer = ConsentRequest::new(RequestId::generate(), requester.id, subject.id, 200);
        store.insert_consent_request(&older).await.unwrap();
        store.insert_consent_request(&newer).await.unwrap();

        let views = store
            .consent_requests_for_subject(&subject.id)
            .await
            .unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].request.id, newer.id);
        assert_eq!(views[0].requester_name, "dr. Chase");
        assert_eq!(views[0].subject_name, "Rebecca Adler");
    }

    #[tokio::test]
    async fn test_access_log_unions_newest_first() {
        let (store, requester, subject) = seeded_store().await;

        let req = ConsentRequest::new(RequestId::generate(), requester.id, subject.id, 500);
        store.insert_consent_request(&req).await.unwrap();

        let rec = record(&subject, 9); // created_at = 1_009
        let hash = ChainHash::digest(&canonical_record_bytes(&rec));
        store.insert_record_with_block(&rec, &hash).await.unwrap();

        let log = store.access_log_for_subject(&subject.id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, AccessAction::CreatedRecord);
        assert_eq!(log[0].actor_name, "dr. Chase");
        assert_eq!(log[0].status, "verified");
        assert_eq!(log[1].action, AccessAction::RequestedConsent);
        assert_eq!(log[1].status, "pending");
    }

    #[tokio::test]
    async fn test_upsert_principal_updates_name() {
        let (store, requester, _) = seeded_store().await;
        let renamed = Principal::new(requester.id, "dr. R. Chase", Role::Requester);
        store.upsert_principal(&renamed).await.unwrap();

        let fetched = store.get_principal(&requester.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "dr. R. Chase");
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medrec.db");

        let subject = principal(0x9a, "Rebecca Adler", Role::Subject);
        let rec = record(&subject, 1);
        let hash = ChainHash::digest(&canonical_record_bytes(&rec));
        {
            let store = SqliteStore::open(&path).unwrap();
            store.upsert_principal(&subject).await.unwrap();
            store.insert_record_with_block(&rec, &hash).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let chain = store.chain_blocks().await.unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].previous_hash, ChainHash::GENESIS);
        assert!(store.get_record(&rec.id).await.unwrap().is_some());
    }
}
