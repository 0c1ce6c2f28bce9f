//! Records, blocks, and principals.
//!
//! A medical record is written once and never mutated. Its sensitive fields
//! are vault envelopes at rest ([`SealedRecord`]) and plaintext only in the
//! read-side shape ([`OpenRecord`]). Every record has exactly one ledger
//! block, created in the same storage transaction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::hash::ChainHash;
use crate::types::{PrincipalId, RecordId};

/// What a principal is allowed to do in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Seeks access to another principal's records (e.g. a doctor).
    Requester,
    /// Owns records and decides on consent (e.g. a patient).
    Subject,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Requester => "requester",
            Role::Subject => "subject",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "requester" => Ok(Role::Requester),
            "subject" => Ok(Role::Subject),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated actor, resolved by the collaborator layer and threaded
/// explicitly into every operation that needs one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: PrincipalId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }
}

/// A medical record as persisted: sensitive fields are vault envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRecord {
    pub id: RecordId,
    pub subject_id: PrincipalId,
    /// Display name of the authoring requester, captured at write time.
    pub author_name: String,
    /// Vault envelope.
    pub diagnosis: String,
    /// Vault envelope.
    pub notes: String,
    /// Opaque reference to an externally stored attachment.
    pub attachment_ref: Option<String>,
    pub created_at: i64,
}

impl SealedRecord {
    /// Produce the read-side shape with decrypted field values.
    pub fn opened(&self, diagnosis: String, notes: String) -> OpenRecord {
        OpenRecord {
            id: self.id,
            subject_id: self.subject_id,
            author_name: self.author_name.clone(),
            diagnosis,
            notes,
            attachment_ref: self.attachment_ref.clone(),
            created_at: self.created_at,
        }
    }
}

/// A medical record with sensitive fields in plaintext. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRecord {
    pub id: RecordId,
    pub subject_id: PrincipalId,
    pub author_name: String,
    pub diagnosis: String,
    pub notes: String,
    pub attachment_ref: Option<String>,
    pub created_at: i64,
}

/// One link of the integrity chain.
///
/// Blocks are immutable once written; the chain is insert-only. `block_id`
/// is assigned by the store and strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBlock {
    pub block_id: i64,
    pub record_id: RecordId,
    /// Digest of the record's canonical bytes.
    pub data_hash: ChainHash,
    /// `data_hash` of the block before this one, or the genesis sentinel.
    pub previous_hash: ChainHash,
    pub created_at: i64,
}

/// What an access-log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    CreatedRecord,
    RequestedConsent,
}

impl AccessAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessAction::CreatedRecord => "created_record",
            AccessAction::RequestedConsent => "requested_consent",
        }
    }
}

/// One entry of the subject-facing audit view: who touched this subject's
/// data and when. Unions record creations and consent requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub actor_name: String,
    pub action: AccessAction,
    /// Record id hex for creations, data scope for consent requests.
    pub detail: String,
    pub timestamp: i64,
    /// "verified" for chained record creations, else the consent status.
    pub status: String,
}
