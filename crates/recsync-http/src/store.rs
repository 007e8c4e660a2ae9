//! [`RecordStore`] implementation over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use recsync_core::error::{Error, NotFoundError, ProtocolError};
use recsync_core::{
    AccountStatus, ApiToken, Cursor, ItemResult, MutationBatch, Permission, PermissionStatus,
    Query, QueryPage, Record, RecordId, RecordStore, Result, StoreUrl, Subscription,
    SubscriptionId, UserIdentity,
};

use crate::client::{HttpClient, classify};
use crate::endpoints::*;

/// A record store reached over the recsync JSON protocol.
///
/// # Example
///
/// ```no_run
/// use recsync_http::HttpStore;
/// use recsync_core::{ApiToken, StoreUrl};
///
/// # fn example() -> recsync_core::Result<()> {
/// let store = HttpStore::builder(StoreUrl::new("https://records.example.com")?)
///     .token(ApiToken::new("secret"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: HttpClient,
}

impl HttpStore {
    pub fn builder(url: StoreUrl) -> HttpStoreBuilder {
        HttpStoreBuilder::new(url)
    }

    /// Returns the underlying HTTP client.
    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}

/// Builder for [`HttpStore`].
#[derive(Debug)]
pub struct HttpStoreBuilder {
    url: StoreUrl,
    token: Option<ApiToken>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl HttpStoreBuilder {
    pub fn new(url: StoreUrl) -> Self {
        Self {
            url,
            token: None,
            user_agent: None,
            timeout: None,
        }
    }

    pub fn token(mut self, token: ApiToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Per-request timeout. Unset means the transport default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpStore> {
        let client = HttpClient::with_options(
            self.url,
            self.token,
            self.user_agent.as_deref(),
            self.timeout,
        )?;
        Ok(HttpStore { client })
    }
}

#[async_trait]
impl RecordStore for HttpStore {
    #[instrument(skip(self, query), fields(record_type = %query.record_type()))]
    async fn query(&self, query: &Query) -> Result<QueryPage> {
        let request = QueryRequest {
            record_type: query.record_type(),
            predicate: query.predicate(),
            cursor: query.cursor().map(Cursor::token),
            limit: query.limit(),
        };

        let response: QueryResponse = self.client.procedure(QUERY_RECORDS, &request).await?;
        debug!(
            count = response.records.len(),
            more = response.cursor.is_some(),
            "query page"
        );

        Ok(QueryPage {
            records: response.records,
            cursor: response.cursor.map(|token| Cursor::new(token, query)),
        })
    }

    #[instrument(skip(self, id), fields(id = %id))]
    async fn lookup(&self, id: &RecordId) -> Result<Record> {
        let params = LookupParams {
            record_name: id.as_str(),
        };

        self.client
            .query(LOOKUP_RECORD, &params)
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => NotFoundError::Record(id.to_string()).into(),
                other => other,
            })
    }

    #[instrument(skip(self, batch), fields(saves = batch.saves().len(), deletes = batch.deletions().len()))]
    async fn modify(&self, batch: &MutationBatch) -> Result<Vec<ItemResult>> {
        let request = ModifyRequest {
            save: batch.saves(),
            delete: batch
                .deletions()
                .iter()
                .map(|d| DeleteEntry {
                    record_name: d.id.as_str(),
                    change_tag: d.change_tag.as_deref(),
                })
                .collect(),
            save_policy: batch.policy(),
            priority: batch.priority(),
        };

        let response: ModifyResponse = self.client.procedure(MODIFY_RECORDS, &request).await?;

        response
            .results
            .into_iter()
            .map(|entry| item_result(entry, batch))
            .collect()
    }

    #[instrument(skip(self))]
    async fn current_identity(&self) -> Result<RecordId> {
        let response: CurrentUserResponse = self.client.query(CURRENT_USER, &NoParams {}).await?;
        RecordId::new(response.record_name).map_err(malformed)
    }

    #[instrument(skip(self, user), fields(user = %user))]
    async fn discover_identity(&self, user: &RecordId) -> Result<Option<UserIdentity>> {
        let params = DiscoverParams {
            user_record_name: user.as_str(),
        };

        match self.client.query::<_, DiscoverResponse>(DISCOVER_USER, &params).await {
            Ok(response) => Ok(response.identity),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn discover_all_identities(&self) -> Result<Vec<UserIdentity>> {
        let response: DiscoverAllResponse =
            self.client.query(DISCOVER_ALL_USERS, &NoParams {}).await?;
        debug!(count = response.identities.len(), "discovered users");
        Ok(response.identities)
    }

    #[instrument(skip(self))]
    async fn account_status(&self) -> Result<AccountStatus> {
        let response: AccountStatusResponse =
            self.client.query(ACCOUNT_STATUS, &NoParams {}).await?;
        Ok(response.status)
    }

    #[instrument(skip(self))]
    async fn permission_status(&self, permission: Permission) -> Result<PermissionStatus> {
        let response: PermissionResponse = self
            .client
            .query(PERMISSION_STATUS, &PermissionParams { permission })
            .await?;
        Ok(response.status)
    }

    #[instrument(skip(self))]
    async fn request_permission(&self, permission: Permission) -> Result<PermissionStatus> {
        let response: PermissionResponse = self
            .client
            .procedure(REQUEST_PERMISSION, &PermissionParams { permission })
            .await?;
        Ok(response.status)
    }

    #[instrument(skip(self, subscription), fields(id = %subscription.id()))]
    async fn save_subscription(&self, subscription: &Subscription) -> Result<Subscription> {
        self.client.procedure(SAVE_SUBSCRIPTION, subscription).await
    }

    #[instrument(skip(self, id), fields(id = %id))]
    async fn delete_subscription(&self, id: &SubscriptionId) -> Result<SubscriptionId> {
        let body = SubscriptionIdBody {
            subscription_id: id.to_string(),
        };

        let response: SubscriptionIdBody = self
            .client
            .procedure(DELETE_SUBSCRIPTION, &body)
            .await
            .map_err(|e| subscription_not_found(e, id))?;

        SubscriptionId::new(response.subscription_id).map_err(malformed)
    }

    #[instrument(skip(self))]
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        let response: ListSubscriptionsResponse =
            self.client.query(LIST_SUBSCRIPTIONS, &NoParams {}).await?;
        Ok(response.subscriptions)
    }

    #[instrument(skip(self, id), fields(id = %id))]
    async fn lookup_subscription(&self, id: &SubscriptionId) -> Result<Subscription> {
        let params = SubscriptionIdBody {
            subscription_id: id.to_string(),
        };

        self.client
            .query(LOOKUP_SUBSCRIPTION, &params)
            .await
            .map_err(|e| subscription_not_found(e, id))
    }
}

/// Convert one records.modify entry into an [`ItemResult`].
fn item_result(entry: ModifyResultEntry, batch: &MutationBatch) -> Result<ItemResult> {
    let id = RecordId::new(entry.record_name.as_str()).map_err(malformed)?;

    match entry.status {
        ItemStatus::Saved => {
            // Stores may omit the echo; fall back to the submitted snapshot.
            let record = entry
                .record
                .or_else(|| batch.saves().iter().find(|r| r.id() == &id).cloned())
                .ok_or_else(|| malformed_message("saved item without a record"))?;
            Ok(ItemResult::saved(record))
        }
        ItemStatus::Deleted => Ok(ItemResult::deleted(id)),
        ItemStatus::Failed => {
            let error = classify(
                None,
                Some(id.as_str()),
                entry.error.unwrap_or_default(),
                None,
            );
            warn!(id = %id, error = %error, "batch item failed");
            Ok(ItemResult::failed(id, error))
        }
    }
}

fn subscription_not_found(err: Error, id: &SubscriptionId) -> Error {
    match err {
        Error::NotFound(_) => NotFoundError::Subscription(id.to_string()).into(),
        other => other,
    }
}

fn malformed(err: Error) -> Error {
    malformed_message(&err.to_string())
}

fn malformed_message(message: &str) -> Error {
    ProtocolError::new(200, None, Some(format!("malformed response: {}", message))).into()
}
