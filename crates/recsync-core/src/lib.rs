//! recsync-core - Core record, query and store types.
//!
//! This crate holds the data model shared by every recsync store
//! implementation and by the sync layer itself: validated identifiers,
//! records and field values, predicates and cursors, mutation batches,
//! subscriptions, account statuses, the unified [`Error`] type and the
//! [`RecordStore`] trait that transports implement.

pub mod account;
pub mod error;
pub mod mutation;
pub mod query;
pub mod record;
pub mod store;
pub mod subscription;
pub mod tokens;
pub mod types;

pub use account::{AccountStatus, Permission, PermissionStatus, UserIdentity};
pub use error::{Error, ErrorKind};
pub use mutation::{Deletion, ItemChange, ItemResult, MutationBatch, Priority, SavePolicy};
pub use query::{Comparison, Cursor, Predicate, Query, QueryPage};
pub use record::{FieldValue, Record, RecordReference, ServerStamp};
pub use store::RecordStore;
pub use subscription::{NotificationInfo, Subscription, SubscriptionTriggers};
pub use tokens::ApiToken;
pub use types::{RecordId, RecordType, StoreUrl, SubscriptionId};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
