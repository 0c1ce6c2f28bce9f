//! End-to-end consent lifecycle against the public API.

use medrec::consent::ConsentError;
use medrec::store::MemoryStore;
use medrec::{
    ConsentDuration, ConsentStatus, Ledger, LedgerConfig, LedgerError, Principal, PrincipalId,
    Role, VaultKey,
};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn test_ledger() -> Ledger<MemoryStore> {
    Ledger::new(
        MemoryStore::new(),
        LedgerConfig::new(VaultKey::from_bytes([0x42; 32])),
    )
}

async fn seeded() -> (Ledger<MemoryStore>, Principal, Principal) {
    let ledger = test_ledger();
    let doctor = Principal::new(PrincipalId::generate(), "dr. House", Role::Requester);
    let patient = Principal::new(PrincipalId::generate(), "Rebecca Adler", Role::Subject);
    ledger.register_principal(&doctor).await.unwrap();
    ledger.register_principal(&patient).await.unwrap();
    (ledger, doctor, patient)
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

#[tokio::test]
async fn full_lifecycle_request_grant_expire_revoke() {
    let (ledger, doctor, patient) = seeded().await;

    // No requests yet: the gate denies.
    assert!(!ledger.authorize(doctor.id, patient.id).await.unwrap());

    // Doctor asks; request is pending and still denies.
    let request = ledger.request_consent(&doctor, patient.id).await.unwrap();
    assert_eq!(
        ledger.consent_status(&doctor, patient.id).await.unwrap(),
        Some(ConsentStatus::Pending)
    );
    assert!(!ledger.authorize(doctor.id, patient.id).await.unwrap());

    // Patient grants for 24 hours.
    ledger
        .grant_consent(&patient, request, ConsentDuration::TwentyFourHours, "all")
        .await
        .unwrap();
    assert!(ledger.authorize(doctor.id, patient.id).await.unwrap());

    // The grant carries an expiry roughly 24h out.
    let views = ledger.consent_requests_for(&patient).await.unwrap();
    let expires_at = views[0].request.expires_at.unwrap();
    let drift = expires_at - (now_millis() + DAY_MS);
    assert!(drift.abs() < 60_000, "expiry not ~24h out: drift {}ms", drift);

    // Advance the clock past the expiry: gate flips to deny.
    assert!(!ledger
        .authorize_at(doctor.id, patient.id, expires_at + 1)
        .await
        .unwrap());

    // The stored row is still nominally granted, so list shows it and the
    // patient can still revoke it.
    let views = ledger.consent_requests_for(&patient).await.unwrap();
    assert_eq!(views[0].request.status, ConsentStatus::Granted);
    ledger.revoke_consent(&patient, request).await.unwrap();
    assert_eq!(
        ledger.consent_status(&doctor, patient.id).await.unwrap(),
        Some(ConsentStatus::Revoked)
    );
    assert!(!ledger.authorize(doctor.id, patient.id).await.unwrap());
}

#[tokio::test]
async fn deny_is_terminal() {
    let (ledger, doctor, patient) = seeded().await;
    let request = ledger.request_consent(&doctor, patient.id).await.unwrap();
    ledger.deny_consent(&patient, request).await.unwrap();

    for attempt in [
        ledger
            .grant_consent(&patient, request, ConsentDuration::Permanent, "all")
            .await,
        ledger.deny_consent(&patient, request).await,
        ledger.revoke_consent(&patient, request).await,
    ] {
        assert!(matches!(
            attempt.unwrap_err(),
            LedgerError::Consent(ConsentError::NotEligible)
        ));
    }
    assert!(!ledger.authorize(doctor.id, patient.id).await.unwrap());
}

#[tokio::test]
async fn grant_is_scoped_to_one_pair() {
    let (ledger, doctor, patient) = seeded().await;
    let second_doctor = Principal::new(PrincipalId::generate(), "dr. Wilson", Role::Requester);
    ledger.register_principal(&second_doctor).await.unwrap();

    let request = ledger.request_consent(&doctor, patient.id).await.unwrap();
    ledger
        .grant_consent(&patient, request, ConsentDuration::Permanent, "all")
        .await
        .unwrap();

    assert!(ledger.authorize(doctor.id, patient.id).await.unwrap());
    assert!(!ledger.authorize(second_doctor.id, patient.id).await.unwrap());
}

#[tokio::test]
async fn newer_request_does_not_disturb_standing_grant() {
    let (ledger, doctor, patient) = seeded().await;

    let first = ledger.request_consent(&doctor, patient.id).await.unwrap();
    ledger
        .grant_consent(&patient, first, ConsentDuration::Permanent, "all")
        .await
        .unwrap();

    // A fresh pending request changes the presentation status, but the gate
    // keys off the granted row.
    let _second = ledger.request_consent(&doctor, patient.id).await.unwrap();
    assert_eq!(
        ledger.consent_status(&doctor, patient.id).await.unwrap(),
        Some(ConsentStatus::Pending)
    );
    assert!(ledger.authorize(doctor.id, patient.id).await.unwrap());
}

#[tokio::test]
async fn listing_shows_names_newest_first() {
    let (ledger, doctor, patient) = seeded().await;
    let second_doctor = Principal::new(PrincipalId::generate(), "dr. Wilson", Role::Requester);
    ledger.register_principal(&second_doctor).await.unwrap();

    ledger.request_consent(&doctor, patient.id).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    ledger
        .request_consent(&second_doctor, patient.id)
        .await
        .unwrap();

    let views = ledger.consent_requests_for(&patient).await.unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].requester_name, "dr. Wilson");
    assert_eq!(views[1].requester_name, "dr. House");
    assert!(views.iter().all(|v| v.subject_name == "Rebecca Adler"));
}
