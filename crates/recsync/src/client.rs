//! The record client: paginated fetches and batched mutations.

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures_util::Stream;
use tracing::{debug, instrument, warn};

use recsync_core::error::ProtocolError;
use recsync_core::record::{CREATION_DATE_KEY, CREATOR_KEY};
use recsync_core::{
    Deletion, Error, ItemChange, ItemResult, MutationBatch, Predicate, Query, Record, RecordId,
    RecordReference, RecordStore, RecordType, Result, SavePolicy, UserIdentity,
};

use crate::config::ClientConfig;
use crate::gate::{AccountGate, Advisor};
use crate::subscriptions::SubscriptionManager;

/// Callback invoked once per fetched record, in server order.
pub type RecordSink<'a> = Option<&'a mut (dyn FnMut(&Record) + Send)>;

/// Callback invoked once per batch item as its result is known.
pub type ItemSink<'a> = Option<&'a mut (dyn FnMut(&ItemResult) + Send)>;

/// The result of a paginated fetch.
///
/// Records retrieved before a failure are kept alongside the error.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub records: Vec<Record>,
    pub error: Option<Error>,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Discard partial results on failure.
    pub fn into_result(self) -> Result<Vec<Record>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.records),
        }
    }

    fn failed(error: Error) -> Self {
        Self {
            records: Vec::new(),
            error: Some(error),
        }
    }
}

/// The result of a mutation batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Server snapshots of every saved record.
    pub saved: Vec<Record>,
    /// Names of every deleted record.
    pub deleted: Vec<RecordId>,
    /// Items that failed, with their errors.
    pub failures: Vec<(RecordId, Error)>,
    /// The batch error: the submission failure, or
    /// [`Error::PartialFailure`] when any item failed.
    pub error: Option<Error>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn failed(error: Error) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Client for one remote record store.
///
/// Cloning is cheap; clones share the store connection.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use recsync::{RecordClient, Predicate, RecordType};
/// use recsync_memory::MemoryStore;
///
/// # async fn example() -> recsync::Result<()> {
/// let client = RecordClient::new(Arc::new(MemoryStore::new()));
/// let mut seen = 0;
/// let mut on_record = |_: &recsync::Record| seen += 1;
///
/// let outcome = client
///     .fetch(&RecordType::new("Note")?, Predicate::all(), Some(&mut on_record))
///     .await;
/// let notes = outcome.into_result()?;
/// assert_eq!(notes.len(), seen);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RecordClient {
    store: Arc<dyn RecordStore>,
    config: ClientConfig,
}

impl RecordClient {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_config(store, ClientConfig::default())
    }

    pub fn with_config(store: Arc<dyn RecordStore>, config: ClientConfig) -> Self {
        Self { store, config }
    }

    /// The shared store connection.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A subscription manager sharing this client's connection.
    pub fn subscriptions(&self) -> SubscriptionManager {
        SubscriptionManager::new(Arc::clone(&self.store))
    }

    /// An account gate sharing this client's connection.
    pub fn account_gate(&self, advisor: Arc<dyn Advisor>) -> AccountGate {
        AccountGate::new(Arc::clone(&self.store), advisor)
    }

    // ========================================================================
    // Fetching
    // ========================================================================

    /// Fetch every record of `record_type` matching `predicate`.
    pub async fn fetch(
        &self,
        record_type: &RecordType,
        predicate: Predicate,
        on_record: RecordSink<'_>,
    ) -> FetchOutcome {
        self.fetch_query(Query::new(record_type.clone(), predicate), on_record)
            .await
    }

    /// Run `query` to completion, following cursors until the store
    /// returns none.
    ///
    /// Each record reaches `on_record` as soon as its page arrives. A
    /// failing page ends the fetch; records from earlier pages are kept.
    #[instrument(skip_all, fields(record_type = %query.record_type()))]
    pub async fn fetch_query(&self, query: Query, mut on_record: RecordSink<'_>) -> FetchOutcome {
        let limit = query.limit().or(self.config.page_size);
        let mut query = query.with_limit(limit);
        let mut records = Vec::new();
        let mut pages = 0usize;

        loop {
            let page = match self.store.query(&query).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(pages, fetched = records.len(), error = %e, "fetch failed");
                    return FetchOutcome {
                        records,
                        error: Some(e),
                    };
                }
            };
            pages += 1;

            if let Some(sink) = on_record.as_deref_mut() {
                for record in &page.records {
                    sink(record);
                }
            }
            records.extend(page.records);

            let Some(cursor) = page.cursor else { break };
            query = match query.resume(cursor) {
                Ok(next) => next,
                Err(e) => {
                    return FetchOutcome {
                        records,
                        error: Some(e),
                    };
                }
            };
        }

        debug!(pages, fetched = records.len(), "fetch complete");
        FetchOutcome {
            records,
            error: None,
        }
    }

    /// Fetch a single record by name.
    #[instrument(skip(self))]
    pub async fn fetch_by_id(&self, id: &RecordId) -> Result<Record> {
        self.store.lookup(id).await
    }

    /// Fetch the records of `record_type` created by the caller.
    ///
    /// If the caller's identity cannot be resolved the outcome carries
    /// that error and no query is made.
    pub async fn fetch_for_current_identity(
        &self,
        record_type: &RecordType,
        on_record: RecordSink<'_>,
    ) -> FetchOutcome {
        let identity = match self.store.current_identity().await {
            Ok(id) => id,
            Err(e) => return FetchOutcome::failed(e),
        };

        let creator = RecordReference::identity(identity);
        self.fetch(record_type, Predicate::eq(CREATOR_KEY, creator), on_record)
            .await
    }

    /// Fetch the caller's own identity record.
    pub async fn fetch_current_identity_record(&self) -> Result<Record> {
        let identity = self.store.current_identity().await?;
        self.store.lookup(&identity).await
    }

    /// Look up the names a user has made discoverable.
    ///
    /// Failures are logged and read as "no identity", so callers can fall
    /// back to showing the bare record name.
    #[instrument(skip(self))]
    pub async fn fetch_user_identity(&self, user: &RecordId) -> Option<UserIdentity> {
        match self.store.discover_identity(user).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "user discovery failed");
                None
            }
        }
    }

    /// List every user discoverable by the caller.
    #[instrument(skip(self))]
    pub async fn fetch_discoverable_users(&self) -> Result<Vec<UserIdentity>> {
        let users = self.store.discover_all_identities().await.inspect_err(|e| {
            warn!(error = %e, "listing discoverable users failed");
        })?;
        debug!(count = users.len(), "discoverable users");
        Ok(users)
    }

    /// Fetch records created strictly between `from` and `to`.
    pub async fn fetch_in_date_range(
        &self,
        record_type: &RecordType,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        on_record: RecordSink<'_>,
    ) -> FetchOutcome {
        let predicate =
            Predicate::gt(CREATION_DATE_KEY, from).and(Predicate::lt(CREATION_DATE_KEY, to));
        self.fetch(record_type, predicate, on_record).await
    }

    /// Stream the results of `query`, fetching pages as they are consumed.
    ///
    /// The stream ends after the last page or after the first error.
    pub fn fetch_stream(&self, query: Query) -> RecordStream {
        let store = Arc::clone(&self.store);
        let limit = query.limit().or(self.config.page_size);
        let mut query = query.with_limit(limit);

        let stream = async_stream::stream! {
            loop {
                let page = match store.query(&query).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };

                for record in page.records {
                    yield Ok(record);
                }

                let Some(cursor) = page.cursor else { break };
                match query.resume(cursor) {
                    Ok(next) => query = next,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        };

        RecordStream {
            inner: Box::pin(stream),
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Save one record, merging its fields into the server copy.
    pub async fn save(&self, record: Record) -> Result<Record> {
        let id = record.id().clone();
        let batch = MutationBatch::new(SavePolicy::ChangedKeys)
            .save(record)
            .with_priority(self.config.save_priority);

        match single_result(&id, self.store.modify(&batch).await?)? {
            ItemChange::Saved(record) => Ok(record),
            ItemChange::Deleted => Err(unexpected(&id, "reported as deleted")),
        }
    }

    /// Save several records in one round trip.
    pub async fn save_batch(
        &self,
        records: Vec<Record>,
        policy: SavePolicy,
        on_per_record: ItemSink<'_>,
    ) -> BatchOutcome {
        let batch = MutationBatch::new(policy)
            .save_all(records)
            .with_priority(self.config.save_priority);
        self.modify(batch, on_per_record).await
    }

    /// Delete one record by name, regardless of its server version.
    pub async fn delete_by_id(&self, id: &RecordId) -> Result<RecordId> {
        let batch = MutationBatch::new(SavePolicy::IfServerRecordUnchanged)
            .delete(id)
            .with_priority(self.config.delete_priority);

        match single_result(id, self.store.modify(&batch).await?)? {
            ItemChange::Deleted => Ok(id.clone()),
            ItemChange::Saved(_) => Err(unexpected(id, "reported as saved")),
        }
    }

    /// Delete several records in one round trip.
    ///
    /// Deletions built from fetched records fail with a conflict if the
    /// server copy changed since; bare names are deleted unconditionally.
    pub async fn delete_batch<D: Into<Deletion>>(
        &self,
        deletions: impl IntoIterator<Item = D>,
        on_per_record: ItemSink<'_>,
    ) -> BatchOutcome {
        let batch = MutationBatch::new(SavePolicy::IfServerRecordUnchanged)
            .delete_all(deletions)
            .with_priority(self.config.delete_priority);
        self.modify(batch, on_per_record).await
    }

    /// Submit a mixed batch of saves and deletions.
    ///
    /// `on_per_record` sees every item result before this returns. An item
    /// the store does not report on fails with a protocol error; results for
    /// names outside the batch are ignored. The outcome's error is set if
    /// the batch could not be submitted or if any item failed.
    #[instrument(skip_all, fields(items = batch.len(), policy = ?batch.policy()))]
    pub async fn modify(
        &self,
        batch: MutationBatch,
        mut on_per_record: ItemSink<'_>,
    ) -> BatchOutcome {
        if batch.is_empty() {
            return BatchOutcome::default();
        }

        let results = match self.store.modify(&batch).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "batch rejected");
                return BatchOutcome::failed(e);
            }
        };

        let total = batch.len();
        let mut outcome = BatchOutcome::default();
        let mut pending: HashSet<&RecordId> = batch
            .saves()
            .iter()
            .map(Record::id)
            .chain(batch.deletions().iter().map(|d| &d.id))
            .collect();

        for result in results {
            if !pending.remove(&result.id) {
                warn!(id = %result.id, "ignoring unexpected batch result");
                continue;
            }
            record_item(&mut outcome, result, &mut on_per_record);
        }

        // Items the store never reported on count as failed.
        let submitted = batch
            .saves()
            .iter()
            .map(Record::id)
            .chain(batch.deletions().iter().map(|d| &d.id));
        for id in submitted {
            if pending.remove(id) {
                let error = unexpected(id, "missing from batch results");
                warn!(id = %id, "no result for batch item");
                let missing = ItemResult::failed(id.clone(), error);
                record_item(&mut outcome, missing, &mut on_per_record);
            }
        }

        if !outcome.failures.is_empty() {
            let failed = outcome.failures.len();
            warn!(failed, total, "batch partially failed");
            outcome.error = Some(Error::PartialFailure { failed, total });
        } else {
            debug!(
                saved = outcome.saved.len(),
                deleted = outcome.deleted.len(),
                "batch complete"
            );
        }

        outcome
    }
}

impl std::fmt::Debug for RecordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Report one item result to the sink and file it in the outcome.
fn record_item(outcome: &mut BatchOutcome, result: ItemResult, sink: &mut ItemSink<'_>) {
    if let Some(sink) = sink.as_deref_mut() {
        sink(&result);
    }
    match result.outcome {
        Ok(ItemChange::Saved(record)) => outcome.saved.push(record),
        Ok(ItemChange::Deleted) => outcome.deleted.push(result.id),
        Err(e) => outcome.failures.push((result.id, e)),
    }
}

/// Pick the result for `id` out of a single-item batch.
fn single_result(id: &RecordId, results: Vec<ItemResult>) -> Result<ItemChange> {
    results
        .into_iter()
        .find(|r| &r.id == id)
        .ok_or_else(|| unexpected(id, "missing from batch results"))?
        .outcome
}

fn unexpected(id: &RecordId, what: &str) -> Error {
    ProtocolError::new(200, None, Some(format!("record {} {}", id, what))).into()
}

/// A stream of fetched records. See [`RecordClient::fetch_stream`].
pub struct RecordStream {
    inner: Pin<Box<dyn Stream<Item = Result<Record>> + Send>>,
}

impl Stream for RecordStream {
    type Item = Result<Record>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream").finish_non_exhaustive()
    }
}
