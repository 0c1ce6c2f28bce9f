//! Strong type definitions for the medrec ledger.
//!
//! All identifiers are newtypes to prevent misuse at compile time. A
//! requester id can never be passed where a record id is expected.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// A 16-byte principal identifier.
///
/// Principals (requesters and subjects) are authenticated by a collaborator
/// layer before they reach this crate; the id is the only thing the core
/// trusts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub [u8; 16]);

/// A 16-byte medical record identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub [u8; 16]);

/// A 16-byte consent request identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub [u8; 16]);

macro_rules! id_impls {
    ($name:ident, $label:expr) => {
        impl $name {
            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                let mut bytes = [0u8; 16];
                rand::thread_rng().fill_bytes(&mut bytes);
                Self(bytes)
            }

            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; 16] {
                &self.0
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex string.
            pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
                let bytes =
                    hex::decode(s).map_err(|_| ValidationError::InvalidId(s.to_string()))?;
                let arr: [u8; 16] = bytes
                    .try_into()
                    .map_err(|_| ValidationError::InvalidId(s.to_string()))?;
                Ok(Self(arr))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $label, self.to_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; 16]> for $name {
            fn from(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }
        }
    };
}

id_impls!(PrincipalId, "PrincipalId");
id_impls!(RecordId, "RecordId");
id_impls!(RequestId, "RequestId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_hex_roundtrip() {
        let id = RecordId::from_bytes([0x42; 16]);
        let hex = id.to_hex();
        let recovered = RecordId::from_hex(&hex).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_id_from_hex_rejects_wrong_length() {
        assert!(PrincipalId::from_hex("abcd").is_err());
        assert!(PrincipalId::from_hex("not hex at all").is_err());
    }

    #[test]
    fn test_generate_is_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_display() {
        let id = PrincipalId::from_bytes([0xab; 16]);
        assert_eq!(format!("{}", id), "ab".repeat(16));
    }
}
