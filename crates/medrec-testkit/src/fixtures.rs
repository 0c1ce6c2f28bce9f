//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: an in-memory ledger under a
//! fixed vault key, with one requester and one subject already registered.

use medrec::{
    CommittedRecord, ConsentDuration, Ledger, LedgerConfig, Principal, PrincipalId, RecordDraft,
    RequestId, Role, VaultKey,
};
use medrec_store::MemoryStore;
use medrec_vault::Vault;

/// The vault key every fixture runs under.
pub const FIXTURE_KEY: [u8; 32] = [0x42; 32];

/// A vault over the fixture key, for crafting or inspecting envelopes
/// outside the ledger's own paths.
pub fn fixture_vault() -> Vault {
    Vault::new(VaultKey::from_bytes(FIXTURE_KEY))
}

/// A test fixture with a memory-backed ledger and two principals.
pub struct TestFixture {
    pub ledger: Ledger<MemoryStore>,
    pub requester: Principal,
    pub subject: Principal,
}

impl TestFixture {
    /// Create a fixture with random principal ids.
    pub async fn new() -> Self {
        Self::with_principals(
            Principal::new(PrincipalId::generate(), "dr. House", Role::Requester),
            Principal::new(PrincipalId::generate(), "Rebecca Adler", Role::Subject),
        )
        .await
    }

    /// Create a fixture around specific principals.
    pub async fn with_principals(requester: Principal, subject: Principal) -> Self {
        let ledger = Ledger::new(
            MemoryStore::new(),
            LedgerConfig::new(VaultKey::from_bytes(FIXTURE_KEY)),
        );
        ledger.register_principal(&requester).await.unwrap();
        ledger.register_principal(&subject).await.unwrap();
        Self {
            ledger,
            requester,
            subject,
        }
    }

    /// Register one more principal.
    pub async fn register(&self, principal: &Principal) {
        self.ledger.register_principal(principal).await.unwrap();
    }

    /// Create a record authored by the fixture requester for the fixture
    /// subject.
    pub async fn commit_record(&self, diagnosis: &str, notes: &str) -> CommittedRecord {
        self.ledger
            .create_record(
                &self.requester,
                self.subject.id,
                RecordDraft::new(diagnosis, notes),
            )
            .await
            .unwrap()
    }

    /// Run the full request-then-grant handshake and return the request id.
    pub async fn grant_consent(&self, duration: ConsentDuration) -> RequestId {
        let request = self
            .ledger
            .request_consent(&self.requester, self.subject.id)
            .await
            .unwrap();
        self.ledger
            .grant_consent(&self.subject, request, duration, "all")
            .await
            .unwrap();
        request
    }
}

/// A fixture plus `count` extra requesters, for multi-party tests.
pub async fn multi_requester_fixture(count: usize) -> (TestFixture, Vec<Principal>) {
    let fixture = TestFixture::new().await;
    let mut requesters = Vec::with_capacity(count);
    for i in 0..count {
        let requester = Principal::new(
            PrincipalId::generate(),
            format!("dr. #{}", i),
            Role::Requester,
        );
        fixture.register(&requester).await;
        requesters.push(requester);
    }
    (fixture, requesters)
}
