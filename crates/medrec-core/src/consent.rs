//! Consent state: the authorization negotiation between two principals.
//!
//! A consent request moves through a one-way state machine. The only edge
//! out of a terminal-looking state is grant -> revoke; everything else is
//! final. Expiry never mutates the stored status — it is evaluated as a
//! predicate at authorization time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::types::{PrincipalId, RequestId};

/// Milliseconds in 24 hours.
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Lifecycle status of a consent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentStatus {
    /// Created by the requester, awaiting the subject's decision.
    Pending,
    /// Approved by the subject; may later be revoked.
    Granted,
    /// Refused by the subject. Terminal.
    Denied,
    /// Withdrawn by the subject after a grant. Terminal.
    Revoked,
}

impl ConsentStatus {
    /// Stable string form, as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentStatus::Pending => "pending",
            ConsentStatus::Granted => "granted",
            ConsentStatus::Denied => "denied",
            ConsentStatus::Revoked => "revoked",
        }
    }

    /// Parse the persisted string form.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "pending" => Ok(ConsentStatus::Pending),
            "granted" => Ok(ConsentStatus::Granted),
            "denied" => Ok(ConsentStatus::Denied),
            "revoked" => Ok(ConsentStatus::Revoked),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }

    /// Whether the state machine permits moving from `self` to `to`.
    ///
    /// Legal edges: pending -> granted, pending -> denied, granted -> revoked.
    pub fn can_transition(&self, to: ConsentStatus) -> bool {
        matches!(
            (self, to),
            (ConsentStatus::Pending, ConsentStatus::Granted)
                | (ConsentStatus::Pending, ConsentStatus::Denied)
                | (ConsentStatus::Granted, ConsentStatus::Revoked)
        )
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsentStatus::Denied | ConsentStatus::Revoked)
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long a grant stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsentDuration {
    /// Expires 24 hours after the grant.
    #[serde(rename = "24h")]
    TwentyFourHours,
    /// Never expires (until revoked).
    #[serde(rename = "permanent")]
    Permanent,
}

impl ConsentDuration {
    /// Stable string form, as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentDuration::TwentyFourHours => "24h",
            ConsentDuration::Permanent => "permanent",
        }
    }

    /// Parse the persisted string form.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "24h" => Ok(ConsentDuration::TwentyFourHours),
            "permanent" => Ok(ConsentDuration::Permanent),
            other => Err(ValidationError::UnknownDuration(other.to_string())),
        }
    }

    /// Expiry timestamp for a grant issued at `now` (Unix milliseconds).
    ///
    /// Set if and only if the duration is bounded.
    pub fn expires_at(&self, now: i64) -> Option<i64> {
        match self {
            ConsentDuration::TwentyFourHours => Some(now + DAY_MS),
            ConsentDuration::Permanent => None,
        }
    }
}

impl fmt::Display for ConsentDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One authorization negotiation between a requester and a subject.
///
/// Created by the requester, mutated only by the subject. Many requests may
/// exist for the same pair over time; readers consider the newest one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRequest {
    pub id: RequestId,
    pub requester_id: PrincipalId,
    pub subject_id: PrincipalId,
    pub status: ConsentStatus,
    /// Set when granted.
    pub duration: Option<ConsentDuration>,
    /// Free-form scope string, set when granted. Not interpreted here.
    pub data_scope: Option<String>,
    /// Set iff duration is `TwentyFourHours`.
    pub expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ConsentRequest {
    /// Create a fresh pending request.
    pub fn new(
        id: RequestId,
        requester_id: PrincipalId,
        subject_id: PrincipalId,
        now: i64,
    ) -> Self {
        Self {
            id,
            requester_id,
            subject_id,
            status: ConsentStatus::Pending,
            duration: None,
            data_scope: None,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this request authorizes access at `now`.
    ///
    /// True iff granted and not past its expiry. `now == expires_at` does
    /// not authorize.
    pub fn is_active(&self, now: i64) -> bool {
        self.status == ConsentStatus::Granted
            && self.expires_at.map_or(true, |expires| expires > now)
    }
}

/// A consent request joined with display names, for presentation.
///
/// Read-side only; never consulted for authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRequestView {
    pub request: ConsentRequest,
    pub requester_name: String,
    pub subject_name: String,
}
