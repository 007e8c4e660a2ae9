//! The in-memory store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use recsync_core::error::{Error, InvalidInputError, NotFoundError};
use recsync_core::{
    AccountStatus, Cursor, ItemResult, MutationBatch, Permission, PermissionStatus, Query,
    QueryPage, Record, RecordId, RecordReference, RecordStore, RecordType, Result, ServerStamp,
    Subscription, SubscriptionId, UserIdentity,
};

use crate::policy::{WriteStamp, apply_save, check_delete};

/// Page size used when a query carries no limit.
const DEFAULT_PAGE_SIZE: usize = 100;

/// A stored record and its insertion sequence, which fixes query order.
#[derive(Debug, Clone)]
struct Stored {
    seq: u64,
    record: Record,
}

#[derive(Debug)]
struct State {
    records: BTreeMap<RecordId, Stored>,
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
    directory: BTreeMap<RecordId, UserIdentity>,
    next_seq: u64,
    identity: RecordId,
    account: AccountStatus,
    permission: PermissionStatus,
    permission_on_request: PermissionStatus,
    permission_requests: usize,
    queries: usize,
}

impl State {
    fn insert(&mut self, record: Record) {
        let seq = match self.records.get(record.id()) {
            Some(stored) => stored.seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.records.insert(record.id().clone(), Stored { seq, record });
    }

    fn identity_reference(&self) -> RecordReference {
        RecordReference::identity(self.identity.clone())
    }

    /// Discovery needs the caller's discoverability permission.
    fn check_discovery(&self) -> Result<()> {
        match self.permission {
            PermissionStatus::Granted => Ok(()),
            status => Err(Error::PermissionDenied {
                message: format!("user discoverability is {:?}", status),
            }),
        }
    }
}

/// An in-process [`RecordStore`].
///
/// Clones share the same underlying data. Records are returned in
/// insertion order; cursors are offsets into the filtered result set.
///
/// # Example
///
/// ```
/// use recsync_core::{Predicate, Query, Record, RecordStore, RecordType};
/// use recsync_memory::MemoryStore;
///
/// # async fn example() -> recsync_core::Result<()> {
/// let store = MemoryStore::new();
/// let notes = RecordType::new("Note")?;
/// store.insert(Record::new(notes.clone()).with_field("title", "hi")).await;
///
/// let page = store.query(&Query::new(notes, Predicate::all())).await?;
/// assert_eq!(page.records.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with a fresh caller identity.
    ///
    /// The identity's own record (of type `Users`) exists from the start.
    pub fn new() -> Self {
        let identity = RecordId::generate();
        let mut state = State {
            records: BTreeMap::new(),
            subscriptions: BTreeMap::new(),
            directory: BTreeMap::new(),
            next_seq: 0,
            identity: identity.clone(),
            account: AccountStatus::Available,
            permission: PermissionStatus::Granted,
            permission_on_request: PermissionStatus::Granted,
            permission_requests: 0,
            queries: 0,
        };

        let now = Utc::now();
        state.insert(Record::with_id(identity, RecordType::users()).stamped(ServerStamp {
            created_at: Some(now),
            creator: None,
            modified_at: Some(now),
            change_tag: Some(new_change_tag()),
        }));

        Self {
            state: Arc::new(RwLock::new(state)),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the page size used when a query carries no limit.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// The identity `current_identity` resolves to.
    pub async fn identity(&self) -> RecordId {
        self.state.read().await.identity.clone()
    }

    /// Store a record as-is, bypassing save policies.
    ///
    /// Missing server metadata is filled in: the creation date and
    /// modification date default to now, the creator to the store identity
    /// and the change tag to a fresh value. Returns the stored snapshot.
    pub async fn insert(&self, record: Record) -> Record {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let stored = record.clone().stamped(ServerStamp {
            created_at: Some(record.created_at().copied().unwrap_or(now)),
            creator: Some(
                record
                    .creator()
                    .cloned()
                    .unwrap_or_else(|| state.identity_reference()),
            ),
            modified_at: Some(record.modified_at().copied().unwrap_or(now)),
            change_tag: Some(
                record
                    .change_tag()
                    .map(str::to_string)
                    .unwrap_or_else(new_change_tag),
            ),
        });
        state.insert(stored.clone());
        stored
    }

    /// Store a record created at a specific instant.
    pub async fn insert_created_at(&self, record: Record, created_at: DateTime<Utc>) -> Record {
        let stamped = record.stamped(ServerStamp {
            created_at: Some(created_at),
            modified_at: Some(created_at),
            ..ServerStamp::default()
        });
        self.insert(stamped).await
    }

    /// Simulate another writer: give the stored record a new change tag.
    pub async fn touch(&self, id: &RecordId) -> Result<Record> {
        let mut state = self.state.write().await;
        let existing = state
            .records
            .get(id)
            .map(|s| s.record.clone())
            .ok_or_else(|| NotFoundError::Record(id.to_string()))?;

        let touched = existing.clone().stamped(ServerStamp {
            created_at: existing.created_at().copied(),
            creator: existing.creator().cloned(),
            modified_at: Some(Utc::now()),
            change_tag: Some(new_change_tag()),
        });
        state.insert(touched.clone());
        Ok(touched)
    }

    /// The server copy of a record, if present.
    pub async fn get(&self, id: &RecordId) -> Option<Record> {
        self.state
            .read()
            .await
            .records
            .get(id)
            .map(|s| s.record.clone())
    }

    /// Number of stored records, including the identity record.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of query pages served so far.
    pub async fn query_count(&self) -> usize {
        self.state.read().await.queries
    }

    pub async fn set_account_status(&self, status: AccountStatus) {
        self.state.write().await.account = status;
    }

    /// Set the reported permission status and the answer to a request.
    pub async fn set_permission(&self, status: PermissionStatus, on_request: PermissionStatus) {
        let mut state = self.state.write().await;
        state.permission = status;
        state.permission_on_request = on_request;
    }

    /// Make a user discoverable, replacing any identity with the same
    /// record.
    pub async fn add_identity(&self, identity: UserIdentity) {
        self.state
            .write()
            .await
            .directory
            .insert(identity.user_record_id.clone(), identity);
    }

    /// Number of permission requests received.
    pub async fn permission_requests(&self) -> usize {
        self.state.read().await.permission_requests
    }
}

fn new_change_tag() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl RecordStore for MemoryStore {
    #[instrument(skip(self, query), fields(record_type = %query.record_type()))]
    async fn query(&self, query: &Query) -> Result<QueryPage> {
        let offset = match query.cursor() {
            Some(cursor) => cursor.token().parse::<usize>().map_err(|_| {
                InvalidInputError::Other {
                    message: format!("unrecognised cursor '{}'", cursor.token()),
                }
            })?,
            None => 0,
        };
        let limit = query
            .limit()
            .map(|l| l.max(1) as usize)
            .unwrap_or(self.page_size);

        let mut state = self.state.write().await;
        state.queries += 1;

        let mut matching: Vec<&Stored> = state
            .records
            .values()
            .filter(|s| s.record.record_type() == query.record_type())
            .filter(|s| query.predicate().matches(&s.record))
            .collect();
        matching.sort_by_key(|s| s.seq);

        let total = matching.len();
        let records: Vec<Record> = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|s| s.record.clone())
            .collect();

        let next = offset + records.len();
        let cursor = (next < total).then(|| Cursor::new(next.to_string(), query));

        debug!(count = records.len(), total, offset, "query page");

        Ok(QueryPage { records, cursor })
    }

    #[instrument(skip(self, id), fields(id = %id))]
    async fn lookup(&self, id: &RecordId) -> Result<Record> {
        self.get(id)
            .await
            .ok_or_else(|| NotFoundError::Record(id.to_string()).into())
    }

    #[instrument(skip(self, batch), fields(saves = batch.saves().len(), deletes = batch.deletions().len()))]
    async fn modify(&self, batch: &MutationBatch) -> Result<Vec<ItemResult>> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut results = Vec::with_capacity(batch.len());

        for submitted in batch.saves() {
            let existing = state.records.get(submitted.id()).map(|s| &s.record);
            let stamp = WriteStamp {
                now,
                creator: state.identity_reference(),
                change_tag: new_change_tag(),
            };

            match apply_save(existing, submitted, batch.policy(), stamp) {
                Ok(saved) => {
                    state.insert(saved.clone());
                    results.push(ItemResult::saved(saved));
                }
                Err(e) => {
                    warn!(id = %submitted.id(), error = %e, "save rejected");
                    results.push(ItemResult::failed(submitted.id().clone(), e));
                }
            }
        }

        for deletion in batch.deletions() {
            let existing = state.records.get(&deletion.id).map(|s| &s.record);

            match check_delete(existing, deletion, batch.policy()) {
                Ok(()) => {
                    state.records.remove(&deletion.id);
                    results.push(ItemResult::deleted(deletion.id.clone()));
                }
                Err(e) => {
                    warn!(id = %deletion.id, error = %e, "delete rejected");
                    results.push(ItemResult::failed(deletion.id.clone(), e));
                }
            }
        }

        Ok(results)
    }

    async fn current_identity(&self) -> Result<RecordId> {
        Ok(self.identity().await)
    }

    async fn account_status(&self) -> Result<AccountStatus> {
        Ok(self.state.read().await.account)
    }

    async fn permission_status(&self, _permission: Permission) -> Result<PermissionStatus> {
        Ok(self.state.read().await.permission)
    }

    async fn request_permission(&self, _permission: Permission) -> Result<PermissionStatus> {
        let mut state = self.state.write().await;
        state.permission_requests += 1;
        if state.permission == PermissionStatus::Pending {
            state.permission = state.permission_on_request;
        }
        Ok(state.permission)
    }

    #[instrument(skip(self, user), fields(user = %user))]
    async fn discover_identity(&self, user: &RecordId) -> Result<Option<UserIdentity>> {
        let state = self.state.read().await;
        state.check_discovery()?;
        Ok(state.directory.get(user).cloned())
    }

    async fn discover_all_identities(&self) -> Result<Vec<UserIdentity>> {
        let state = self.state.read().await;
        state.check_discovery()?;
        Ok(state.directory.values().cloned().collect())
    }

    #[instrument(skip(self, subscription), fields(id = %subscription.id()))]
    async fn save_subscription(&self, subscription: &Subscription) -> Result<Subscription> {
        let mut state = self.state.write().await;
        let replaced = state
            .subscriptions
            .insert(subscription.id().clone(), subscription.clone())
            .is_some();
        debug!(replaced, "saved subscription");
        Ok(subscription.clone())
    }

    #[instrument(skip(self, id), fields(id = %id))]
    async fn delete_subscription(&self, id: &SubscriptionId) -> Result<SubscriptionId> {
        self.state
            .write()
            .await
            .subscriptions
            .remove(id)
            .map(|s| s.id().clone())
            .ok_or_else(|| NotFoundError::Subscription(id.to_string()).into())
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        Ok(self
            .state
            .read()
            .await
            .subscriptions
            .values()
            .cloned()
            .collect())
    }

    async fn lookup_subscription(&self, id: &SubscriptionId) -> Result<Subscription> {
        self.state
            .read()
            .await
            .subscriptions
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError::Subscription(id.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recsync_core::{
        Deletion, ErrorKind, FieldValue, ItemChange, Predicate, SavePolicy, SubscriptionTriggers,
    };

    fn notes() -> RecordType {
        RecordType::new("Note").unwrap()
    }

    async fn seeded(count: usize) -> MemoryStore {
        let store = MemoryStore::new().with_page_size(3);
        for i in 0..count {
            store
                .insert(Record::new(notes()).with_field("n", i as i64))
                .await;
        }
        store
    }

    #[tokio::test]
    async fn pages_in_insertion_order() {
        let store = seeded(7).await;
        let query = Query::new(notes(), Predicate::all());

        let mut seen = Vec::new();
        let mut page = store.query(&query).await.unwrap();
        loop {
            seen.extend(
                page.records
                    .iter()
                    .filter_map(|r| r.get("n").and_then(FieldValue::as_int)),
            );
            match page.cursor {
                Some(cursor) => page = store.query(&query.resume(cursor).unwrap()).await.unwrap(),
                None => break,
            }
        }

        assert_eq!(seen, (0..7).collect::<Vec<_>>());
        assert_eq!(store.query_count().await, 3);
    }

    #[tokio::test]
    async fn query_filters_by_type_and_predicate() {
        let store = seeded(5).await;
        let query = Query::new(notes(), Predicate::ge("n", 3)).with_limit(Some(10));
        let page = store.query(&query).await.unwrap();
        assert_eq!(page.records.len(), 2);
        assert!(page.cursor.is_none());

        let users = Query::new(RecordType::users(), Predicate::all());
        assert_eq!(store.query(&users).await.unwrap().records.len(), 1);
    }

    #[tokio::test]
    async fn exact_page_boundary_has_no_cursor() {
        let store = seeded(3).await;
        let page = store
            .query(&Query::new(notes(), Predicate::all()))
            .await
            .unwrap();
        assert_eq!(page.records.len(), 3);
        assert!(page.cursor.is_none());
    }

    #[tokio::test]
    async fn lookup_and_identity() {
        let store = MemoryStore::new();
        let me = store.current_identity().await.unwrap();
        let record = store.lookup(&me).await.unwrap();
        assert_eq!(record.record_type(), &RecordType::users());

        let err = store
            .lookup(&RecordId::new("missing").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(NotFoundError::Record(_))));
    }

    #[tokio::test]
    async fn insert_stamps_creator() {
        let store = MemoryStore::new();
        let saved = store.insert(Record::new(notes())).await;
        assert_eq!(
            saved.creator().map(|c| c.id()),
            Some(&store.identity().await)
        );
        assert!(saved.change_tag().is_some());
    }

    #[tokio::test]
    async fn modify_reports_each_item() {
        let store = MemoryStore::new();
        let kept = store.insert(Record::new(notes())).await;
        let stale = store.insert(Record::new(notes())).await;
        store.touch(stale.id()).await.unwrap();

        let batch = MutationBatch::new(SavePolicy::IfServerRecordUnchanged)
            .save(Record::new(notes()).with_field("fresh", 1))
            .delete(&kept)
            .delete(&stale)
            .delete(RecordId::new("ghost").unwrap());

        let results = store.modify(&batch).await.unwrap();
        assert_eq!(results.len(), 4);
        assert!(matches!(results[0].outcome, Ok(ItemChange::Saved(_))));
        assert!(matches!(results[1].outcome, Ok(ItemChange::Deleted)));
        assert!(matches!(results[2].outcome, Err(Error::Conflict(_))));
        assert!(matches!(results[3].outcome, Err(Error::NotFound(_))));

        assert!(store.get(kept.id()).await.is_none());
        assert!(store.get(stale.id()).await.is_some());
    }

    #[tokio::test]
    async fn id_only_delete_ignores_change_tag() {
        let store = MemoryStore::new();
        let record = store.insert(Record::new(notes())).await;
        store.touch(record.id()).await.unwrap();

        let batch = MutationBatch::new(SavePolicy::IfServerRecordUnchanged)
            .delete(Deletion::from(record.id()));
        let results = store.modify(&batch).await.unwrap();
        assert!(results[0].is_ok());
    }

    #[tokio::test]
    async fn permission_request_resolves_pending() {
        let store = MemoryStore::new();
        store
            .set_permission(PermissionStatus::Pending, PermissionStatus::Denied)
            .await;

        let perm = Permission::UserDiscoverability;
        assert_eq!(
            store.permission_status(perm).await.unwrap(),
            PermissionStatus::Pending
        );
        assert_eq!(
            store.request_permission(perm).await.unwrap(),
            PermissionStatus::Denied
        );
        assert_eq!(store.permission_requests().await, 1);
    }

    #[tokio::test]
    async fn subscriptions_replace_by_id() {
        let store = MemoryStore::new();
        let id = SubscriptionId::new("s1").unwrap();

        store
            .save_subscription(&Subscription::new(id.clone(), notes(), Predicate::all()))
            .await
            .unwrap();
        store
            .save_subscription(
                &Subscription::new(id.clone(), notes(), Predicate::eq("n", 1))
                    .with_triggers(SubscriptionTriggers::on_create()),
            )
            .await
            .unwrap();

        let all = store.list_subscriptions().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].predicate(), &Predicate::eq("n", 1));

        assert_eq!(store.delete_subscription(&id).await.unwrap(), id);
        let err = store.lookup_subscription(&id).await.unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound(NotFoundError::Subscription(_))
        ));
    }

    #[tokio::test]
    async fn discovery_needs_permission() {
        let store = MemoryStore::new();
        let ada = RecordId::new("_ada").unwrap();
        store
            .add_identity(UserIdentity::new(ada.clone()).with_names("Ada", "Lovelace"))
            .await;

        let found = store.discover_identity(&ada).await.unwrap().unwrap();
        assert_eq!(found.given_name.as_deref(), Some("Ada"));
        let unknown = RecordId::new("_nobody").unwrap();
        assert_eq!(store.discover_identity(&unknown).await.unwrap(), None);
        assert_eq!(store.discover_all_identities().await.unwrap().len(), 1);

        store
            .set_permission(PermissionStatus::Denied, PermissionStatus::Denied)
            .await;
        let err = store.discover_all_identities().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }
}
