//! The record store trait.

use async_trait::async_trait;

use crate::Result;
use crate::account::{AccountStatus, Permission, PermissionStatus, UserIdentity};
use crate::mutation::{ItemResult, MutationBatch};
use crate::query::{Query, QueryPage};
use crate::record::Record;
use crate::subscription::Subscription;
use crate::types::{RecordId, SubscriptionId};

/// A connection to a remote record store.
///
/// Each method is a single round trip; pagination, batching policy
/// defaults and account gating live above this trait in the sync layer.
/// Implementations must be safe to share between concurrent callers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one page of results for `query`.
    ///
    /// The returned cursor, if any, must be bound to `query` (see
    /// [`Cursor::new`](crate::Cursor::new)).
    async fn query(&self, query: &Query) -> Result<QueryPage>;

    /// Fetch a single record by name.
    async fn lookup(&self, id: &RecordId) -> Result<Record>;

    /// Apply a mutation batch.
    ///
    /// `Err` means the batch as a whole could not be submitted; otherwise
    /// there is one [`ItemResult`] per batch item, in any order.
    async fn modify(&self, batch: &MutationBatch) -> Result<Vec<ItemResult>>;

    /// Resolve the identity record of the current caller.
    async fn current_identity(&self) -> Result<RecordId>;

    /// Report whether the caller's account can use the store.
    async fn account_status(&self) -> Result<AccountStatus>;

    /// Report the state of an application permission.
    async fn permission_status(&self, permission: Permission) -> Result<PermissionStatus>;

    /// Ask the caller to grant an application permission.
    async fn request_permission(&self, permission: Permission) -> Result<PermissionStatus>;

    /// Look up the discoverable identity behind a user record.
    ///
    /// `Ok(None)` means the user exists but is not discoverable, or is
    /// unknown to the store.
    async fn discover_identity(&self, user: &RecordId) -> Result<Option<UserIdentity>>;

    /// List every identity discoverable by the caller.
    async fn discover_all_identities(&self) -> Result<Vec<UserIdentity>>;

    /// Create or replace the subscription with the same id.
    async fn save_subscription(&self, subscription: &Subscription) -> Result<Subscription>;

    /// Remove a subscription, returning its id.
    async fn delete_subscription(&self, id: &SubscriptionId) -> Result<SubscriptionId>;

    /// List every subscription registered by the caller.
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>>;

    /// Fetch one subscription by id.
    async fn lookup_subscription(&self, id: &SubscriptionId) -> Result<Subscription>;
}
