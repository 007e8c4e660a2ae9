//! Record client, subscription and gate behaviour against the in-memory store.

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use recsync::error::{AuthError, NotFoundError};
use recsync::{
    AccountGate, AccountState, AccountStatus, Advisor, Advisory, BlockReason, Deletion, Error,
    ErrorKind, ItemResult, MutationBatch, NotificationInfo, PermissionState, PermissionStatus,
    Predicate, Record, RecordClient, RecordId, RecordType, SavePolicy, SubscriptionId,
    SubscriptionTriggers, UserIdentity,
};
use recsync_memory::MemoryStore;

fn notes() -> RecordType {
    RecordType::new("Note").unwrap()
}

fn setup() -> (MemoryStore, RecordClient) {
    let store = MemoryStore::new().with_page_size(2);
    let client = RecordClient::new(Arc::new(store.clone()));
    (store, client)
}

// ============================================================================
// Mutation Tests
// ============================================================================

#[tokio::test]
async fn test_batch_delete_fails_only_the_changed_record() {
    let (store, client) = setup();
    for i in 0..3 {
        store
            .insert(Record::new(notes()).with_field("n", i as i64))
            .await;
    }

    let fetched = client
        .fetch(&notes(), Predicate::all(), None)
        .await
        .into_result()
        .unwrap();
    assert_eq!(fetched.len(), 3);

    // Another writer changes the second record after we fetched it.
    let changed = fetched[1].id().clone();
    store.touch(&changed).await.unwrap();

    let mut per_record = Vec::new();
    let mut on_item = |r: &ItemResult| per_record.push((r.id.clone(), r.is_ok()));
    let outcome = client.delete_batch(&fetched, Some(&mut on_item)).await;

    assert_eq!(per_record.len(), 3);
    assert_eq!(outcome.deleted.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, changed);
    assert_eq!(outcome.failures[0].1.kind(), ErrorKind::Conflict);
    assert!(matches!(
        outcome.error,
        Some(Error::PartialFailure {
            failed: 1,
            total: 3
        })
    ));

    assert!(store.get(&changed).await.is_some());
    assert!(store.get(fetched[0].id()).await.is_none());
}

#[tokio::test]
async fn test_save_merges_into_changed_server_copy() {
    let (store, client) = setup();
    let original = store
        .insert(
            Record::new(notes())
                .with_field("title", "draft")
                .with_field("body", "text"),
        )
        .await;
    store.touch(original.id()).await.unwrap();

    let mut edit = Record::with_id(original.id().clone(), notes());
    edit.set("title", "final");
    let saved = client.save(edit).await.unwrap();

    assert_eq!(saved.get("title").and_then(|v| v.as_str()), Some("final"));
    assert_eq!(saved.get("body").and_then(|v| v.as_str()), Some("text"));
    assert_ne!(saved.change_tag(), original.change_tag());
}

#[tokio::test]
async fn test_save_batch_reports_each_record() {
    let (_store, client) = setup();
    let records: Vec<_> = (0..3)
        .map(|i| Record::new(notes()).with_field("n", i as i64))
        .collect();

    let mut seen = 0;
    let mut on_item = |r: &ItemResult| {
        assert!(r.is_ok());
        seen += 1;
    };
    let outcome = client
        .save_batch(records, SavePolicy::AllKeys, Some(&mut on_item))
        .await;

    assert_eq!(seen, 3);
    assert!(outcome.is_success());
    assert_eq!(outcome.saved.len(), 3);
    assert!(outcome.saved.iter().all(|r| r.change_tag().is_some()));
}

#[tokio::test]
async fn test_save_batch_unchanged_policy_rejects_stale_snapshot() {
    let (store, client) = setup();
    let stale = store.insert(Record::new(notes())).await;
    store.touch(stale.id()).await.unwrap();

    let outcome = client
        .save_batch(
            vec![stale.with_field("x", 1), Record::new(notes())],
            SavePolicy::IfServerRecordUnchanged,
            None,
        )
        .await;

    assert_eq!(outcome.saved.len(), 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.error.map(|e| e.kind()), Some(ErrorKind::PartialFailure));
}

#[tokio::test]
async fn test_delete_by_id_and_missing_record() {
    let (store, client) = setup();
    let record = store.insert(Record::new(notes())).await;
    store.touch(record.id()).await.unwrap();

    // Bare names carry no change tag and are deleted unconditionally.
    assert_eq!(client.delete_by_id(record.id()).await.unwrap(), *record.id());

    let err = client.delete_by_id(record.id()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(NotFoundError::Record(_))));
}

#[tokio::test]
async fn test_mixed_modify_batch() {
    let (store, client) = setup();
    let old = store.insert(Record::new(notes())).await;

    let batch = MutationBatch::new(SavePolicy::ChangedKeys)
        .save(Record::new(notes()).with_field("fresh", 1))
        .delete(Deletion::from(&old));
    let outcome = client.modify(batch, None).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.saved.len(), 1);
    assert_eq!(outcome.deleted, vec![old.id().clone()]);
}

#[tokio::test]
async fn test_empty_batch_makes_no_request() {
    let (store, client) = setup();
    let before = store.len().await;
    let outcome = client.delete_batch(Vec::<RecordId>::new(), None).await;
    assert!(outcome.is_success());
    assert_eq!(store.len().await, before);
}

// ============================================================================
// Query Helper Tests
// ============================================================================

#[tokio::test]
async fn test_date_range_excludes_both_bounds() {
    let (store, client) = setup();
    let day = |d: u32| Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap();

    for d in 1..=5 {
        store
            .insert_created_at(Record::new(notes()).with_field("day", d as i64), day(d))
            .await;
    }

    let outcome = client
        .fetch_in_date_range(&notes(), day(2), day(4), None)
        .await;
    let days: Vec<_> = outcome
        .into_result()
        .unwrap()
        .iter()
        .filter_map(|r| r.get("day").and_then(|v| v.as_int()))
        .collect();

    assert_eq!(days, vec![3]);
}

#[tokio::test]
async fn test_fetch_for_current_identity_filters_by_creator() {
    let (store, client) = setup();
    let me = store.identity().await;

    store.insert(Record::new(notes()).with_field("mine", 1)).await;
    let someone = recsync::RecordReference::identity(RecordId::new("_someone").unwrap());
    store
        .insert(
            Record::new(notes())
                .with_field("mine", 0)
                .stamped(recsync::ServerStamp {
                    creator: Some(someone),
                    ..Default::default()
                }),
        )
        .await;

    let mut count = 0;
    let mut on_record = |r: &Record| {
        assert_eq!(r.creator().map(|c| c.id()), Some(&me));
        count += 1;
    };
    let outcome = client
        .fetch_for_current_identity(&notes(), Some(&mut on_record))
        .await;

    assert!(outcome.error.is_none());
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_identity_record_and_lookup() {
    let (store, client) = setup();
    let me = client.fetch_current_identity_record().await.unwrap();
    assert_eq!(me.id(), &store.identity().await);
    assert_eq!(me.record_type(), &RecordType::users());

    let err = client
        .fetch_by_id(&RecordId::new("nope").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ============================================================================
// User Discovery Tests
// ============================================================================

#[tokio::test]
async fn test_user_identity_names() {
    let (store, client) = setup();
    let ada = RecordId::new("_ada").unwrap();
    store
        .add_identity(UserIdentity::new(ada.clone()).with_names("Ada", "Lovelace"))
        .await;

    let found = client.fetch_user_identity(&ada).await.unwrap();
    assert_eq!(found.display_name().as_deref(), Some("Ada Lovelace"));

    let stranger = RecordId::new("_stranger").unwrap();
    assert!(client.fetch_user_identity(&stranger).await.is_none());
}

#[tokio::test]
async fn test_user_discovery_failure_reads_as_no_identity() {
    let (store, client) = setup();
    let ada = RecordId::new("_ada").unwrap();
    store.add_identity(UserIdentity::new(ada.clone())).await;
    store
        .set_permission(PermissionStatus::Denied, PermissionStatus::Denied)
        .await;

    assert!(client.fetch_user_identity(&ada).await.is_none());
    let err = client.fetch_discoverable_users().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_list_discoverable_users() {
    let (store, client) = setup();
    assert!(client.fetch_discoverable_users().await.unwrap().is_empty());

    for name in ["_ada", "_bob"] {
        store
            .add_identity(UserIdentity::new(RecordId::new(name).unwrap()))
            .await;
    }
    let users = client.fetch_discoverable_users().await.unwrap();
    let names: Vec<_> = users.iter().map(|u| u.user_record_id.as_str()).collect();
    assert_eq!(names, ["_ada", "_bob"]);
}

// ============================================================================
// Subscription Tests
// ============================================================================

#[tokio::test]
async fn test_resubscribe_replaces_registration() {
    let (_store, client) = setup();
    let subs = client.subscriptions();
    let id = SubscriptionId::new("comments-on-p1").unwrap();

    subs.subscribe(
        &notes(),
        Predicate::eq("postId", "p1"),
        id.clone(),
        SubscriptionTriggers::all(),
        NotificationInfo::default(),
    )
    .await
    .unwrap();
    subs.subscribe(
        &notes(),
        Predicate::eq("postId", "p2"),
        id.clone(),
        SubscriptionTriggers::on_create(),
        NotificationInfo {
            alert_body: Some("New comment".into()),
            ..NotificationInfo::default()
        },
    )
    .await
    .unwrap();

    let all = subs.list_subscriptions().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].predicate(), &Predicate::eq("postId", "p2"));

    let fetched = subs.get_subscription(&id).await.unwrap();
    assert_eq!(
        fetched.notification().alert_body.as_deref(),
        Some("New comment")
    );
}

#[tokio::test]
async fn test_unknown_subscription_is_not_found() {
    let (_store, client) = setup();
    let subs = client.subscriptions();
    let id = SubscriptionId::new("missing").unwrap();

    let err = subs.unsubscribe(&id).await.unwrap_err();
    assert!(matches!(
        err,
        Error::NotFound(NotFoundError::Subscription(_))
    ));
    assert_eq!(
        subs.get_subscription(&id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

// ============================================================================
// Account Gate Tests
// ============================================================================

#[derive(Default)]
struct RecordingAdvisor {
    advisories: Mutex<Vec<Advisory>>,
}

impl RecordingAdvisor {
    fn taken(&self) -> Vec<Advisory> {
        self.advisories.lock().unwrap().clone()
    }
}

impl Advisor for RecordingAdvisor {
    fn present(&self, advisory: &Advisory) {
        self.advisories.lock().unwrap().push(advisory.clone());
    }
}

fn gate(store: &MemoryStore) -> (AccountGate, Arc<RecordingAdvisor>) {
    let advisor = Arc::new(RecordingAdvisor::default());
    let gate = AccountGate::new(Arc::new(store.clone()), advisor.clone());
    (gate, advisor)
}

#[tokio::test]
async fn test_gate_available_account() {
    let store = MemoryStore::new();
    let (gate, advisor) = gate(&store);

    assert_eq!(gate.account_state(), AccountState::Unchecked);
    assert!(gate.ensure_available().await.is_ok());
    assert_eq!(gate.account_state(), AccountState::Available);
    assert!(advisor.taken().is_empty());
}

#[tokio::test]
async fn test_gate_blocked_account_advises_once() {
    let store = MemoryStore::new();
    store.set_account_status(AccountStatus::NoAccount).await;
    let (gate, advisor) = gate(&store);

    let state = gate.check_account().await;
    assert_eq!(state, AccountState::Blocked(BlockReason::NoAccount));

    let advisories = advisor.taken();
    assert_eq!(advisories.len(), 1);
    assert!(advisories[0].message.starts_with("Synchronization is disabled\n"));

    let err = gate.ensure_available().await.unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::AccountUnavailable { .. })));
    // The cached state answers without another advisory.
    assert_eq!(advisor.taken().len(), 1);
}

#[tokio::test]
async fn test_gate_requests_pending_permission_once() {
    let store = MemoryStore::new();
    store
        .set_permission(PermissionStatus::Pending, PermissionStatus::Granted)
        .await;
    let (gate, advisor) = gate(&store);

    assert_eq!(gate.check_permission().await, PermissionState::Granted);
    assert_eq!(store.permission_requests().await, 1);
    assert!(advisor.taken().is_empty());
}

#[tokio::test]
async fn test_gate_denied_permission_is_independent_of_account() {
    let store = MemoryStore::new();
    store
        .set_permission(PermissionStatus::Denied, PermissionStatus::Denied)
        .await;
    let (gate, advisor) = gate(&store);

    assert_eq!(gate.check_permission().await, PermissionState::Denied);
    assert_eq!(store.permission_requests().await, 0);
    assert_eq!(gate.account_state(), AccountState::Unchecked);

    let advisories = advisor.taken();
    assert_eq!(advisories.len(), 1);
    assert_eq!(advisories[0].title, "Permissions Error");
}

#[tokio::test]
async fn test_gate_could_not_complete_is_indeterminate() {
    let store = MemoryStore::new();
    store
        .set_permission(PermissionStatus::CouldNotComplete, PermissionStatus::Granted)
        .await;
    let (gate, _advisor) = gate(&store);

    assert_eq!(gate.check_permission().await, PermissionState::Indeterminate);
}
