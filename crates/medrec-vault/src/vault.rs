//! ChaCha20-Poly1305 field vault.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;

use crate::error::{CryptoError, Result};

/// Required key length in bytes.
pub const KEY_LEN: usize = 32;

/// Nonce length in bytes (96-bit, per ChaCha20-Poly1305).
pub const NONCE_LEN: usize = 12;

/// Poly1305 tag length in bytes.
const TAG_LEN: usize = 16;

/// Fixed, non-sensitive stand-in for a field that failed to decrypt.
///
/// Substituted on read paths serving a principal other than the record's
/// subject; the subject's own path surfaces the error instead.
pub const DECRYPT_PLACEHOLDER: &str = "[unreadable field]";

/// A 256-bit vault key, provisioned once at process start.
#[derive(Clone)]
pub struct VaultKey([u8; KEY_LEN]);

impl VaultKey {
    /// Create from exactly `KEY_LEN` bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, rejecting any other length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: KEY_LEN,
                got: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.write_str("VaultKey(..)")
    }
}

/// The field vault. Cheap to clone; holds only the key.
#[derive(Clone)]
pub struct Vault {
    key: VaultKey,
}

impl Vault {
    /// Create a vault over the given key.
    pub fn new(key: VaultKey) -> Self {
        Self { key }
    }

    /// Seal a plaintext field into an opaque hex envelope.
    ///
    /// Draws a fresh random nonce per call; envelope layout is
    /// hex(nonce || ciphertext || tag). The empty string is legal input and
    /// round-trips to the empty string.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = ChaCha20Poly1305::new_from_slice(self.key.as_bytes())
            .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

        let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&ciphertext);
        Ok(hex::encode(envelope))
    }

    /// Open an envelope produced by [`Vault::encrypt`].
    ///
    /// Fails with [`CryptoError::Malformed`] on structurally bad input and
    /// [`CryptoError::AuthenticationFailed`] when the tag does not verify
    /// (tampering, wrong key, corruption).
    pub fn decrypt(&self, envelope: &str) -> Result<String> {
        let bytes =
            hex::decode(envelope).map_err(|e| CryptoError::Malformed(e.to_string()))?;
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Malformed(format!(
                "envelope too short: {} bytes",
                bytes.len()
            )));
        }

        let cipher = ChaCha20Poly1305::new_from_slice(self.key.as_bytes())
            .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::AuthenticationFailed)?;

        String::from_utf8(plaintext).map_err(|e| CryptoError::Malformed(e.to_string()))
    }
}
