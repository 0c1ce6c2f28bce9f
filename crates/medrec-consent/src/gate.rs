//! The consent gate: the read-time authorization check.
//!
//! Runs synchronously on the request path before any sensitive data is
//! released. Holds no state of its own and never memoizes - each call
//! re-reads the store, so a revoke is effective on the very next check.

use std::sync::Arc;

use tracing::debug;

use medrec_core::PrincipalId;
use medrec_store::Store;

use crate::error::Result;

/// Why the gate said no.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No granted request exists for the pair (nothing, pending, denied,
    /// or revoked all land here).
    NoGrant,
    /// A granted request exists but its expiry has passed.
    Expired,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::NoGrant => f.write_str("no active grant"),
            DenialReason::Expired => f.write_str("grant expired"),
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(DenialReason),
}

impl Decision {
    /// Whether access is allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// The consent gate.
pub struct ConsentGate<S: Store> {
    store: Arc<S>,
}

impl<S: Store> ConsentGate<S> {
    /// Create a gate over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// May `requester_id` read `subject_id`'s records right now?
    pub async fn authorize(
        &self,
        requester_id: PrincipalId,
        subject_id: PrincipalId,
    ) -> Result<bool> {
        self.authorize_at(requester_id, subject_id, now_millis())
            .await
    }

    /// [`ConsentGate::authorize`] with an injected clock, for tests.
    pub async fn authorize_at(
        &self,
        requester_id: PrincipalId,
        subject_id: PrincipalId,
        now: i64,
    ) -> Result<bool> {
        Ok(self
            .check_at(requester_id, subject_id, now)
            .await?
            .is_allowed())
    }

    /// Authorization decision with the denial reason, for callers that map
    /// it to a forbidden response.
    pub async fn check(
        &self,
        requester_id: PrincipalId,
        subject_id: PrincipalId,
    ) -> Result<Decision> {
        self.check_at(requester_id, subject_id, now_millis()).await
    }

    /// [`ConsentGate::check`] with an injected clock.
    pub async fn check_at(
        &self,
        requester_id: PrincipalId,
        subject_id: PrincipalId,
        now: i64,
    ) -> Result<Decision> {
        let decision = match self.store.granted_request(&requester_id, &subject_id).await? {
            None => Decision::Denied(DenialReason::NoGrant),
            Some(request) if request.is_active(now) => Decision::Allowed,
            Some(_) => Decision::Denied(DenialReason::Expired),
        };
        debug!(requester = %requester_id, subject = %subject_id, ?decision, "gate checked");
        Ok(decision)
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
