//! Proptest strategies for the domain's value types.

use proptest::prelude::*;

use medrec_core::{ConsentDuration, ConsentStatus, PrincipalId, RecordId, RequestId};

/// Any consent status.
pub fn consent_status() -> impl Strategy<Value = ConsentStatus> {
    prop_oneof![
        Just(ConsentStatus::Pending),
        Just(ConsentStatus::Granted),
        Just(ConsentStatus::Denied),
        Just(ConsentStatus::Revoked),
    ]
}

/// Any consent duration.
pub fn consent_duration() -> impl Strategy<Value = ConsentDuration> {
    prop_oneof![
        Just(ConsentDuration::TwentyFourHours),
        Just(ConsentDuration::Permanent),
    ]
}

/// Arbitrary principal ids.
pub fn principal_id() -> impl Strategy<Value = PrincipalId> {
    any::<[u8; 16]>().prop_map(PrincipalId::from_bytes)
}

/// Arbitrary record ids.
pub fn record_id() -> impl Strategy<Value = RecordId> {
    any::<[u8; 16]>().prop_map(RecordId::from_bytes)
}

/// Arbitrary request ids.
pub fn request_id() -> impl Strategy<Value = RequestId> {
    any::<[u8; 16]>().prop_map(RequestId::from_bytes)
}

/// Free-text field content: unicode, bounded, empty included.
pub fn free_text() -> impl Strategy<Value = String> {
    proptest::string::string_regex(".{0,256}").expect("valid regex")
}
