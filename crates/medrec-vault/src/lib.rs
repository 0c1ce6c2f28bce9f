//! # Medrec Vault
//!
//! Authenticated symmetric encryption for sensitive record fields.
//!
//! Free-text fields (diagnosis, notes) never reach storage in plaintext.
//! The vault seals each field under a fixed process-wide 256-bit key with a
//! fresh random nonce per call, and packs nonce, ciphertext, and tag into a
//! single opaque hex envelope suitable for a text column.
//!
//! Decryption failures are typed ([`CryptoError`]); what to do with one is
//! the caller's decision. Read paths serving a third party substitute
//! [`DECRYPT_PLACEHOLDER`] so a single bad field never blocks the whole
//! read, while the record owner's path surfaces the error.

pub mod error;
pub mod vault;

pub use error::CryptoError;
pub use vault::{Vault, VaultKey, DECRYPT_PLACEHOLDER, KEY_LEN, NONCE_LEN};
