//! Ledger configuration.

use medrec_vault::VaultKey;

use crate::error::Result;

/// Configuration for the [`Ledger`](crate::Ledger).
///
/// The vault key is provisioned by the embedding process (environment,
/// secret store) before the ledger is constructed; a wrong-length key is
/// rejected here, at startup, not on first use.
#[derive(Clone)]
pub struct LedgerConfig {
    /// The 256-bit field-encryption key.
    pub vault_key: VaultKey,
}

impl LedgerConfig {
    /// Create a config from an already-validated key.
    pub fn new(vault_key: VaultKey) -> Self {
        Self { vault_key }
    }

    /// Create a config from raw key bytes, rejecting any length other than
    /// 32 bytes.
    pub fn from_key_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            vault_key: VaultKey::from_slice(bytes)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length_key() {
        assert!(LedgerConfig::from_key_bytes(&[0u8; 32]).is_ok());
        assert!(LedgerConfig::from_key_bytes(&[0u8; 31]).is_err());
        assert!(LedgerConfig::from_key_bytes(b"short").is_err());
    }
}
