//! Linkage handshake and transfers against the in-memory store

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;

use openbanking_core::testing::StubGateway;
use openbanking_core::*;
use openbanking_db::{CredentialStore, DbError, DbResult, InMemoryCredentialStore};
use openbanking_types::*;

fn config() -> OpenBankingConfig {
    OpenBankingConfig {
        client: ClientCredentials {
            client_id: "client".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost/callback".into(),
            ..Default::default()
        },
        settlement_account: "999-1".into(),
        institution_code: "M202300001".into(),
        exchange_lease_secs: 60,
        ..Default::default()
    }
}

struct Harness {
    store: Arc<InMemoryCredentialStore>,
    gateway: Arc<StubGateway>,
    service: Arc<dyn OpenBankingService>,
}

fn harness_with(gateway: StubGateway) -> Harness {
    let store = Arc::new(InMemoryCredentialStore::new());
    let gateway = Arc::new(gateway);
    let service = build_service(&config(), store.clone(), gateway.clone()).unwrap();
    Harness {
        store,
        gateway,
        service,
    }
}

fn harness() -> Harness {
    harness_with(StubGateway::default())
}

/// Store whose saves start failing once armed
struct FlakyStore {
    inner: InMemoryCredentialStore,
    failing: AtomicBool,
}

#[async_trait]
impl CredentialStore for FlakyStore {
    async fn find_by_member_id(&self, member_id: &MemberId) -> DbResult<Option<LinkageRecord>> {
        self.inner.find_by_member_id(member_id).await
    }

    async fn find_by_state(&self, state: &str) -> DbResult<Option<LinkageRecord>> {
        self.inner.find_by_state(state).await
    }

    async fn save(&self, record: &LinkageRecord) -> DbResult<LinkageRecord> {
        if self.failing.load(Ordering::SeqCst) && record.access_token.is_some() {
            return Err(DbError::Connection("database went away".into()));
        }
        self.inner.save(record).await
    }
}

// ============================================================================
// begin_linkage
// ============================================================================

#[tokio::test]
async fn test_begin_creates_pending_record() {
    let h = harness();
    let member = MemberId::new();

    let record = h.service.begin_linkage("s1", member).await.unwrap();
    assert_eq!(record.status(), LinkageStatus::Pending);
    assert_eq!(record.state, "s1");
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_begin_same_state_is_idempotent() {
    let h = harness();
    let member = MemberId::new();

    let first = h.service.begin_linkage("s1", member).await.unwrap();
    let second = h.service.begin_linkage("s1", member).await.unwrap();
    assert_eq!(first, second);

    let stored = h.store.find_by_member_id(&member).await.unwrap().unwrap();
    assert_eq!(stored, first);
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_new_state_supersedes_old() {
    let h = harness();
    let member = MemberId::new();

    h.service.begin_linkage("s1", member).await.unwrap();
    let record = h.service.begin_linkage("s2", member).await.unwrap();
    assert_eq!(record.state, "s2");
    assert_eq!(h.store.len(), 1);
    assert!(h.store.find_by_state("s1").await.unwrap().is_none());

    let err = h.service.complete_linkage("s1", "c1").await.unwrap_err();
    assert!(matches!(err, OpenBankingError::LinkageNotFound { .. }));
    assert_eq!(h.gateway.calls(), 0);
}

#[tokio::test]
async fn test_empty_state_rejected() {
    let h = harness();
    let err = h.service.begin_linkage("  ", MemberId::new()).await.unwrap_err();
    assert_eq!(err.stage(), FailureStage::Request);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_state_owned_by_other_member_rejected() {
    let h = harness();
    h.service.begin_linkage("s1", MemberId::new()).await.unwrap();

    let err = h.service.begin_linkage("s1", MemberId::new()).await.unwrap_err();
    assert!(matches!(err, OpenBankingError::InvalidRequest(_)));
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_completed_linkage_is_terminal() {
    let h = harness();
    let member = MemberId::new();
    h.service.begin_linkage("s1", member).await.unwrap();
    h.service.complete_linkage("s1", "c1").await.unwrap();

    let err = h.service.begin_linkage("s2", member).await.unwrap_err();
    assert!(matches!(
        err,
        OpenBankingError::LinkageAlreadyCompleted { member_id } if member_id == member
    ));

    // Repeating the completed state is still fine
    let record = h.service.begin_linkage("s1", member).await.unwrap();
    assert!(record.is_token_bound());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_begins_keep_one_record() {
    let h = harness();
    let member = MemberId::new();

    let attempts = (0..6).map(|i| {
        let service = h.service.clone();
        tokio::spawn(async move { service.begin_linkage(&format!("s{}", i), member).await })
    });
    for outcome in join_all(attempts).await {
        outcome.unwrap().unwrap();
    }

    assert_eq!(h.store.len(), 1);
    let stored = h.store.find_by_member_id(&member).await.unwrap().unwrap();
    let resolved = h.store.find_by_state(&stored.state).await.unwrap().unwrap();
    assert_eq!(resolved.member_id, member);
}

// ============================================================================
// complete_linkage
// ============================================================================

#[tokio::test]
async fn test_unknown_state_never_calls_remote() {
    let h = harness();

    let err = h.service.complete_linkage("nope", "c1").await.unwrap_err();
    assert!(matches!(err, OpenBankingError::LinkageNotFound { .. }));
    assert_eq!(err.stage(), FailureStage::LinkageLookup);
    assert_eq!(h.gateway.calls(), 0);
}

#[tokio::test]
async fn test_full_handshake() {
    let h = harness();
    let member = MemberId::new();

    h.service.begin_linkage("s1", member).await.unwrap();
    let token = h.service.complete_linkage("s1", "c1").await.unwrap();
    assert_eq!(token.member_id, member);
    assert_eq!(token.access_token.as_str(), "t1");
    assert_eq!(token.user_seq_no, "u1");
    assert!(token.newly_issued);
    assert_eq!(token.refresh_token.map(|t| t.as_str().to_string()).as_deref(), Some("refresh-t1"));

    let record = h.store.find_by_member_id(&member).await.unwrap().unwrap();
    assert_eq!(record.state, "s1");
    assert_eq!(record.authorization_code.as_deref(), Some("c1"));
    assert_eq!(record.access_token.as_ref().map(AccessToken::as_str), Some("t1"));
    assert_eq!(record.remote_user_seq_no.as_deref(), Some("u1"));
    assert!(record.exchange_started_at.is_none());

    let exchange = h.gateway.last_exchange().unwrap();
    assert_eq!(exchange.code, "c1");
    assert_eq!(exchange.client_id, "client");
    assert_eq!(exchange.grant_type, "authorization_code");
}

#[tokio::test]
async fn test_repeated_callback_exchanges_once() {
    let h = harness();
    let member = MemberId::new();
    h.service.begin_linkage("s1", member).await.unwrap();

    let first = h.service.complete_linkage("s1", "c1").await.unwrap();
    let second = h.service.complete_linkage("s1", "c1").await.unwrap();
    assert!(first.newly_issued);
    assert!(!second.newly_issued);
    assert_eq!(second.access_token, first.access_token);
    assert_eq!(h.gateway.exchange_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_callbacks_exchange_once() {
    let h = harness_with(StubGateway::default().with_exchange_delay(Duration::from_millis(50)));
    let member = MemberId::new();
    h.service.begin_linkage("s1", member).await.unwrap();

    let callbacks = (0..8).map(|_| {
        let service = h.service.clone();
        tokio::spawn(async move { service.complete_linkage("s1", "c1").await })
    });

    let mut issued = 0;
    for outcome in join_all(callbacks).await {
        match outcome.unwrap() {
            Ok(token) if token.newly_issued => issued += 1,
            Ok(_) | Err(OpenBankingError::LinkageInProgress { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(issued, 1);
    assert_eq!(h.gateway.exchange_calls(), 1);
    let record = h.store.find_by_member_id(&member).await.unwrap().unwrap();
    assert!(record.is_token_bound());
}

#[tokio::test]
async fn test_failed_exchange_allows_retry() {
    let h = harness();
    let member = MemberId::new();
    h.service.begin_linkage("s1", member).await.unwrap();
    h.gateway.fail_next_exchanges(1);

    let err = h.service.complete_linkage("s1", "c1").await.unwrap_err();
    assert!(matches!(
        err,
        OpenBankingError::RemoteCallFailed { stage: FailureStage::TokenExchange, .. }
    ));

    let record = h.store.find_by_state("s1").await.unwrap().unwrap();
    assert_eq!(record.status(), LinkageStatus::CodeBound);
    assert!(record.exchange_started_at.is_none());

    let token = h.service.complete_linkage("s1", "c1").await.unwrap();
    assert_eq!(token.access_token.as_str(), "t1");
    assert_eq!(h.gateway.exchange_calls(), 2);
}

#[tokio::test]
async fn test_held_lease_blocks_callback_and_new_state() {
    let h = harness();
    let member = MemberId::new();
    let mut record = h.service.begin_linkage("s1", member).await.unwrap();
    record.bind_code("c0", Utc::now());
    h.store.save(&record).await.unwrap();

    let err = h.service.complete_linkage("s1", "c1").await.unwrap_err();
    assert!(matches!(err, OpenBankingError::LinkageInProgress { .. }));

    let err = h.service.begin_linkage("s2", member).await.unwrap_err();
    assert!(matches!(err, OpenBankingError::LinkageInProgress { .. }));
    assert_eq!(h.gateway.calls(), 0);
}

#[tokio::test]
async fn test_expired_lease_is_recovered() {
    let h = harness();
    let member = MemberId::new();
    let mut record = h.service.begin_linkage("s1", member).await.unwrap();
    record.bind_code("c0", Utc::now() - chrono::Duration::minutes(5));
    h.store.save(&record).await.unwrap();

    let token = h.service.complete_linkage("s1", "c1").await.unwrap();
    assert!(token.newly_issued);
    assert_eq!(h.gateway.exchange_calls(), 1);
}

#[test]
fn test_oversized_lease_fails_at_build() {
    let mut cfg = config();
    cfg.exchange_lease_secs = 10_000_000_000_000;
    let result = build_service(
        &cfg,
        Arc::new(InMemoryCredentialStore::new()),
        Arc::new(StubGateway::default()),
    );
    assert!(matches!(result, Err(OpenBankingError::Config(_))));
}

#[tokio::test]
async fn test_unbounded_lease_still_blocks_without_overflow() {
    let store = Arc::new(InMemoryCredentialStore::new());
    let gateway = Arc::new(StubGateway::default());
    let linker = AuthorizationLinker::new(
        store.clone(),
        gateway.clone(),
        config().client,
        chrono::Duration::days(365 * 1_000_000),
    );
    let member = MemberId::new();
    let mut record = linker.begin_linkage("s1", member).await.unwrap();
    record.bind_code("c0", Utc::now());
    store.save(&record).await.unwrap();

    let err = linker.complete_linkage("s1", "c1").await.unwrap_err();
    assert!(matches!(err, OpenBankingError::LinkageInProgress { .. }));

    let err = linker.begin_linkage("s2", member).await.unwrap_err();
    assert!(matches!(err, OpenBankingError::LinkageInProgress { .. }));
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn test_lost_token_write_is_persistence_failure() {
    let store = Arc::new(FlakyStore {
        inner: InMemoryCredentialStore::new(),
        failing: AtomicBool::new(false),
    });
    let gateway = Arc::new(StubGateway::default());
    let service = build_service(&config(), store.clone(), gateway.clone()).unwrap();
    let member = MemberId::new();

    service.begin_linkage("s1", member).await.unwrap();
    store.failing.store(true, Ordering::SeqCst);

    let err = service.complete_linkage("s1", "c1").await.unwrap_err();
    assert_eq!(err.stage(), FailureStage::Persistence);

    let record = store.find_by_state("s1").await.unwrap().unwrap();
    assert_eq!(record.status(), LinkageStatus::CodeBound);
    assert!(record.exchange_started_at.is_some());

    let err = service.complete_linkage("s1", "c1").await.unwrap_err();
    assert!(matches!(err, OpenBankingError::LinkageInProgress { .. }));
    assert_eq!(gateway.exchange_calls(), 1);
}

// ============================================================================
// transfers
// ============================================================================

#[tokio::test]
async fn test_deposit_with_linked_token() {
    let h = harness();
    let member = MemberId::new();
    h.service.begin_linkage("s1", member).await.unwrap();
    let token = h.service.complete_linkage("s1", "c1").await.unwrap();

    let before = Utc::now();
    let result = h
        .service
        .deposit(DepositRequest {
            member_id: member,
            access_token: token.access_token,
            to_account_number: "110-1".into(),
            amount: 10_000,
            print_content: None,
        })
        .await
        .unwrap();

    assert_eq!(result.member_id, member);
    assert_eq!(result.account_number, "110-1");
    assert_eq!(result.api_tran_id, "api-deposit");
    assert_eq!(result.amount, 10_000);
    assert!(result.completed_at >= before);
}

#[tokio::test]
async fn test_withdraw_uses_debited_account() {
    let h = harness();
    let member = MemberId::new();

    let result = h
        .service
        .withdraw(WithdrawRequest {
            member_id: member,
            access_token: AccessToken::new("t1"),
            from_account_number: "220-2".into(),
            amount: 3_000,
            print_content: Some("top up".into()),
        })
        .await
        .unwrap();

    assert_eq!(result.account_number, "220-2");
    assert_eq!(result.api_tran_id, "api-withdraw");

    let payload = h.gateway.last_withdraw().unwrap();
    assert_eq!(payload.fintech_use_num, "220-2");
    assert_eq!(payload.cntr_account_num, "999-1");
    assert_eq!(payload.tran_amt, "3000");
    assert_eq!(payload.wd_print_content, "top up");
    assert_eq!(result.bank_tran_id, payload.bank_tran_id);
}
