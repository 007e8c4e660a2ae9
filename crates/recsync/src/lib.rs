//! recsync - Record synchronization over remote document stores.
//!
//! The sync layer sits on top of any [`RecordStore`]: [`RecordClient`]
//! runs paginated queries and batched mutations, [`SubscriptionManager`]
//! registers push-notification subscriptions, [`AccountGate`] checks that
//! the caller may use the store, and the [`boundary`] module signals when
//! the wall clock crosses a configured daily window.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use recsync::{Predicate, RecordClient, RecordType, StoreUrl, ApiToken};
//! use recsync_http::HttpStore;
//!
//! # async fn example() -> recsync::Result<()> {
//! let store = HttpStore::builder(StoreUrl::new("https://records.example.com")?)
//!     .token(ApiToken::new("secret"))
//!     .build()?;
//! let client = RecordClient::new(Arc::new(store));
//!
//! let comments = RecordType::new("Comment")?;
//! let outcome = client
//!     .fetch(&comments, Predicate::eq("postId", "p1"), None)
//!     .await;
//! for record in &outcome.records {
//!     println!("{}", record.id());
//! }
//! if let Some(e) = outcome.error {
//!     eprintln!("stopped early: {}", e);
//! }
//! # Ok(())
//! # }
//! ```

pub mod boundary;
mod client;
pub mod config;
mod gate;
mod subscriptions;

pub use boundary::{
    BoundaryEvent, BoundaryTracker, BoundaryWatcher, BoundaryWindow, Clock, Countdown,
    SystemClock, WatcherHandle,
};
pub use client::{BatchOutcome, FetchOutcome, ItemSink, RecordClient, RecordSink, RecordStream};
pub use config::{BoundaryConfig, ClientConfig};
pub use gate::{
    AccountGate, AccountState, Advisor, Advisory, BlockReason, LogAdvisor, PermissionState,
};
pub use subscriptions::SubscriptionManager;

pub use recsync_core::{
    AccountStatus, ApiToken, Comparison, Cursor, Deletion, Error, ErrorKind, FieldValue,
    ItemChange, ItemResult, MutationBatch, NotificationInfo, Permission, PermissionStatus,
    Predicate, Priority, Query, QueryPage, Record, RecordId, RecordReference, RecordStore,
    RecordType, Result, SavePolicy, ServerStamp, StoreUrl, Subscription, SubscriptionId,
    SubscriptionTriggers, UserIdentity, error, record,
};
