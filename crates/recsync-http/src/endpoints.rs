//! Endpoint definitions and request/response types.

use serde::{Deserialize, Serialize};

use recsync_core::{
    AccountStatus, Permission, PermissionStatus, Predicate, Priority, Record, RecordType,
    SavePolicy, Subscription, UserIdentity,
};

// ============================================================================
// Endpoint Names
// ============================================================================

/// records.query
pub const QUERY_RECORDS: &str = "records.query";

/// records.lookup
pub const LOOKUP_RECORD: &str = "records.lookup";

/// records.modify
pub const MODIFY_RECORDS: &str = "records.modify";

/// users.current
pub const CURRENT_USER: &str = "users.current";

/// users.discover
pub const DISCOVER_USER: &str = "users.discover";

/// users.discoverAll
pub const DISCOVER_ALL_USERS: &str = "users.discoverAll";

/// account.status
pub const ACCOUNT_STATUS: &str = "account.status";

/// permissions.status
pub const PERMISSION_STATUS: &str = "permissions.status";

/// permissions.request
pub const REQUEST_PERMISSION: &str = "permissions.request";

/// subscriptions.save
pub const SAVE_SUBSCRIPTION: &str = "subscriptions.save";

/// subscriptions.delete
pub const DELETE_SUBSCRIPTION: &str = "subscriptions.delete";

/// subscriptions.list
pub const LIST_SUBSCRIPTIONS: &str = "subscriptions.list";

/// subscriptions.lookup
pub const LOOKUP_SUBSCRIPTION: &str = "subscriptions.lookup";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for records.query.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    pub record_type: &'a RecordType,
    pub predicate: &'a Predicate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Response from records.query.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Query parameters for records.lookup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupParams<'a> {
    pub record_name: &'a str,
}

/// A deletion entry in a records.modify request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEntry<'a> {
    pub record_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_tag: Option<&'a str>,
}

/// Request body for records.modify.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRequest<'a> {
    pub save: &'a [Record],
    pub delete: Vec<DeleteEntry<'a>>,
    pub save_policy: SavePolicy,
    pub priority: Priority,
}

/// Per-item status in a records.modify response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Saved,
    Deleted,
    Failed,
}

/// A single item result from records.modify.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyResultEntry {
    pub record_name: String,
    pub status: ItemStatus,
    #[serde(default)]
    pub record: Option<Record>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

/// Response from records.modify.
#[derive(Debug, Deserialize)]
pub struct ModifyResponse {
    pub results: Vec<ModifyResultEntry>,
}

/// Response from users.current.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub record_name: String,
}

/// Query parameters for users.discover.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverParams<'a> {
    pub user_record_name: &'a str,
}

/// Response from users.discover. A missing identity means the user is
/// not discoverable.
#[derive(Debug, Deserialize)]
pub struct DiscoverResponse {
    #[serde(default)]
    pub identity: Option<UserIdentity>,
}

/// Response from users.discoverAll.
#[derive(Debug, Deserialize)]
pub struct DiscoverAllResponse {
    #[serde(default)]
    pub identities: Vec<UserIdentity>,
}

/// Response from account.status.
#[derive(Debug, Deserialize)]
pub struct AccountStatusResponse {
    pub status: AccountStatus,
}

/// Query parameters for permissions.status, body for permissions.request.
#[derive(Debug, Serialize)]
pub struct PermissionParams {
    pub permission: Permission,
}

/// Response from permissions.status and permissions.request.
#[derive(Debug, Deserialize)]
pub struct PermissionResponse {
    pub status: PermissionStatus,
}

/// Body of subscriptions.delete, parameters of subscriptions.lookup, and
/// response of subscriptions.delete.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionIdBody {
    pub subscription_id: String,
}

/// Response from subscriptions.list.
#[derive(Debug, Deserialize)]
pub struct ListSubscriptionsResponse {
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

/// Error response format, also used for failed batch items.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub server_change_tag: Option<String>,
    #[serde(default)]
    pub retry_after: Option<u64>,
}

/// Empty parameter set for queries that take none.
#[derive(Debug, Serialize)]
pub struct NoParams {}
