//! Consent ledger operations.
//!
//! Thin domain layer over the store: identifier generation, expiry
//! computation, and the rows-affected-to-error translation. The atomic
//! guards themselves live in the storage layer.

use std::sync::Arc;

use tracing::debug;

use medrec_core::{
    ConsentDuration, ConsentRequest, ConsentRequestView, ConsentStatus, PrincipalId, RequestId,
};
use medrec_store::Store;

use crate::error::{ConsentError, Result};

/// The consent ledger: create and decide authorization requests.
pub struct ConsentLedger<S: Store> {
    store: Arc<S>,
}

impl<S: Store> ConsentLedger<S> {
    /// Create a ledger over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a new pending request from a requester to a subject.
    ///
    /// Duplicates are permitted: nothing stops a requester from asking
    /// again while an earlier request is still open. Readers consider the
    /// newest request per pair, so stale duplicates are inert.
    pub async fn create_request(
        &self,
        requester_id: PrincipalId,
        subject_id: PrincipalId,
    ) -> Result<RequestId> {
        let now = now_millis();
        let request = ConsentRequest::new(RequestId::generate(), requester_id, subject_id, now);
        self.store.insert_consent_request(&request).await?;
        debug!(request = %request.id, requester = %requester_id, subject = %subject_id,
               "consent request created");
        Ok(request.id)
    }

    /// Grant a pending request, as the subject.
    ///
    /// `expires_at` is derived from the duration: now + 24h for the bounded
    /// class, absent for permanent. Fails with [`ConsentError::NotEligible`]
    /// if the request is missing, not owned by `subject_id`, or not pending.
    pub async fn grant(
        &self,
        request_id: RequestId,
        subject_id: PrincipalId,
        duration: ConsentDuration,
        data_scope: &str,
    ) -> Result<()> {
        let now = now_millis();
        let expires_at = duration.expires_at(now);
        let rows = self
            .store
            .grant_consent(&request_id, &subject_id, duration, data_scope, expires_at, now)
            .await?;
        if rows == 0 {
            return Err(ConsentError::NotEligible);
        }
        debug!(request = %request_id, %duration, "consent granted");
        Ok(())
    }

    /// Deny a pending request, as the subject.
    pub async fn deny(&self, request_id: RequestId, subject_id: PrincipalId) -> Result<()> {
        let rows = self
            .store
            .deny_consent(&request_id, &subject_id, now_millis())
            .await?;
        if rows == 0 {
            return Err(ConsentError::NotEligible);
        }
        debug!(request = %request_id, "consent denied");
        Ok(())
    }

    /// Revoke a granted request, as the subject.
    ///
    /// Succeeds on any nominally granted row, including one whose expiry
    /// has already passed: the stored status is a recorded decision, and
    /// expiry is evaluated only at authorization time.
    pub async fn revoke(&self, request_id: RequestId, subject_id: PrincipalId) -> Result<()> {
        let rows = self
            .store
            .revoke_consent(&request_id, &subject_id, now_millis())
            .await?;
        if rows == 0 {
            return Err(ConsentError::NotEligible);
        }
        debug!(request = %request_id, "consent revoked");
        Ok(())
    }

    /// All requests addressed to a subject, newest first, with display
    /// names. Presentation only - never an authorization check.
    pub async fn list_for_subject(
        &self,
        subject_id: PrincipalId,
    ) -> Result<Vec<ConsentRequestView>> {
        Ok(self.store.consent_requests_for_subject(&subject_id).await?)
    }

    /// Status of the newest request between a pair, if any. Presentation
    /// only (e.g. "not yet requested" badges in a search view).
    pub async fn current_status(
        &self,
        requester_id: PrincipalId,
        subject_id: PrincipalId,
    ) -> Result<Option<ConsentStatus>> {
        Ok(self
            .store
            .latest_request_status(&requester_id, &subject_id)
            .await?)
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
    use medrec_core::{Principal, Role};
    use medrec_store::MemoryStore;

    fn pid(byte: u8) -> PrincipalId {
        PrincipalId::from_bytes([byte; 16])
    }

    async fn ledger() -> (ConsentLedger<MemoryStore>, PrincipalId, PrincipalId) {
        let store = Arc::new(MemoryStore::new());
        let requester = pid(0xd0);
        let subject = pid(0x9a);
        store
            .upsert_principal(&Principal::new(requester, "dr. Foreman", Role::Requester))
            .await
            .unwrap();
        store
            .upsert_principal(&Principal::new(subject, "John Henry Giles", Role::Subject))
            .await
            .unwrap();
        (ConsentLedger::new(store), requester, subject)
    }

    #[tokio::test]
    async fn test_create_then_grant() {
        let (ledger, requester, subject) = ledger().await;
        let id = ledger.create_request(requester, subject).await.unwrap();

        ledger
            .grant(id, subject, ConsentDuration::TwentyFourHours, "all")
            .await
            .unwrap();

        let views = ledger.list_for_subject(subject).await.unwrap();
        assert_eq!(views.len(), 1);
        let req = &views[0].request;
        assert_eq!(req.status, ConsentStatus::Granted);
        assert_eq!(req.duration, Some(ConsentDuration::TwentyFourHours));
        assert!(req.expires_at.is_some());
        assert_eq!(views[0].requester_name, "dr. Foreman");
    }

    #[tokio::test]
    async fn test_permanent_grant_has_no_expiry() {
        let (ledger, requester, subject) = ledger().await;
        let id = ledger.create_request(requester, subject).await.unwrap();
        ledger
            .grant(id, subject, ConsentDuration::Permanent, "all")
            .await
            .unwrap();

        let views = ledger.list_for_subject(subject).await.unwrap();
        assert_eq!(views[0].request.expires_at, None);
    }

    #[tokio::test]
    async fn test_grant_wrong_subject_not_eligible() {
        let (ledger, requester, subject) = ledger().await;
        let id = ledger.create_request(requester, subject).await.unwrap();

        let err = ledger
            .grant(id, pid(0xee), ConsentDuration::Permanent, "all")
            .await
            .unwrap_err();
        assert!(matches!(err, ConsentError::NotEligible));
    }

    #[tokio::test]
    async fn test_grant_after_deny_not_eligible() {
        let (ledger, requester, subject) = ledger().await;
        let id = ledger.create_request(requester, subject).await.unwrap();
        ledger.deny(id, subject).await.unwrap();

        let err = ledger
            .grant(id, subject, ConsentDuration::Permanent, "all")
            .await
            .unwrap_err();
        assert!(matches!(err, ConsentError::NotEligible));

        // And the stored state did not move.
        let views = ledger.list_for_subject(subject).await.unwrap();
        assert_eq!(views[0].request.status, ConsentStatus::Denied);
    }

    #[tokio::test]
    async fn test_missing_request_not_eligible() {
        let (ledger, _, subject) = ledger().await;
        let err = ledger.deny(RequestId::generate(), subject).await.unwrap_err();
        assert!(matches!(err, ConsentError::NotEligible));
    }

    #[tokio::test]
    async fn test_duplicate_requests_newest_wins() {
        let (ledger, requester, subject) = ledger().await;
        let first = ledger.create_request(requester, subject).await.unwrap();
        let second = ledger.create_request(requester, subject).await.unwrap();
        assert_ne!(first, second);

        ledger.deny(second, subject).await.unwrap();
        assert_eq!(
            ledger.current_status(requester, subject).await.unwrap(),
            Some(ConsentStatus::Denied)
        );
    }

    #[tokio::test]
    async fn test_current_status_none_without_requests() {
        let (ledger, requester, subject) = ledger().await;
        assert_eq!(ledger.current_status(requester, subject).await.unwrap(), None);
    }
}
