//! Canonical record encoding for chain hashing.
//!
//! The chain digest of a record is computed over a deterministic CBOR
//! encoding: a definite-length array of the record's fields in fixed order.
//! The same record always produces identical bytes, and thus an identical
//! digest, on every platform.
//!
//! Field order: record id, subject id, author name, diagnosis envelope,
//! notes envelope, attachment reference (empty string when absent).

use ciborium::value::Value;

use crate::record::SealedRecord;

/// Encode a sealed record to canonical bytes.
///
/// Sensitive fields enter the hash in their encrypted form; the chain
/// fingerprints exactly what is stored.
pub fn canonical_record_bytes(record: &SealedRecord) -> Vec<u8> {
    let value = Value::Array(vec![
        Value::Bytes(record.id.as_bytes().to_vec()),
        Value::Bytes(record.subject_id.as_bytes().to_vec()),
        Value::Text(record.author_name.clone()),
        Value::Text(record.diagnosis.clone()),
        Value::Text(record.notes.clone()),
        Value::Text(record.attachment_ref.clone().unwrap_or_default()),
    ]);

    let mut buf = Vec::new();
    // Serializing a Value into a Vec cannot fail.
    ciborium::into_writer(&value, &mut buf).expect("CBOR encoding of record failed");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrincipalId, RecordId};

    fn sample() -> SealedRecord {
        SealedRecord {
            id: RecordId::from_bytes([1; 16]),
            subject_id: PrincipalId::from_bytes([2; 16]),
            author_name: "dr. Wilson".to_string(),
            diagnosis: "aabb".to_string(),
            notes: "ccdd".to_string(),
            attachment_ref: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_encoding_deterministic() {
        let a = canonical_record_bytes(&sample());
        let b = canonical_record_bytes(&sample());
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_field_affects_encoding() {
        let base = canonical_record_bytes(&sample());

        let mut changed = sample();
        changed.author_name = "dr. Cuddy".to_string();
        assert_ne!(base, canonical_record_bytes(&changed));

        let mut changed = sample();
        changed.diagnosis = "eeff".to_string();
        assert_ne!(base, canonical_record_bytes(&changed));

        let mut changed = sample();
        changed.attachment_ref = Some("cid".to_string());
        assert_ne!(base, canonical_record_bytes(&changed));
    }

    #[test]
    fn test_timestamp_not_hashed() {
        // The digest covers content, not the write-time clock.
        let mut later = sample();
        later.created_at = 99;
        assert_eq!(canonical_record_bytes(&sample()), canonical_record_bytes(&later));
    }
}
