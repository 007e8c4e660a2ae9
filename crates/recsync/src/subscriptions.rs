//! Push-notification subscription management.

use std::sync::Arc;

use tracing::{debug, instrument};

use recsync_core::{
    NotificationInfo, Predicate, RecordStore, RecordType, Result, Subscription, SubscriptionId,
    SubscriptionTriggers,
};

/// Registers and inspects query subscriptions.
///
/// Shares the store connection with the [`RecordClient`](crate::RecordClient)
/// it was created from.
#[derive(Clone)]
pub struct SubscriptionManager {
    store: Arc<dyn RecordStore>,
}

impl SubscriptionManager {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Register a subscription, replacing any existing one with the same id.
    #[instrument(skip_all, fields(record_type = %record_type, id = %id))]
    pub async fn subscribe(
        &self,
        record_type: &RecordType,
        predicate: Predicate,
        id: SubscriptionId,
        triggers: SubscriptionTriggers,
        notification: NotificationInfo,
    ) -> Result<Subscription> {
        let subscription = Subscription::new(id, record_type.clone(), predicate)
            .with_triggers(triggers)
            .with_notification(notification);

        let saved = self.store.save_subscription(&subscription).await?;
        debug!("subscription registered");
        Ok(saved)
    }

    /// Remove a subscription. Unknown ids are a not-found error.
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn unsubscribe(&self, id: &SubscriptionId) -> Result<SubscriptionId> {
        self.store.delete_subscription(id).await
    }

    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.store.list_subscriptions().await
    }

    /// Fetch one subscription. Unknown ids are a not-found error.
    pub async fn get_subscription(&self, id: &SubscriptionId) -> Result<Subscription> {
        self.store.lookup_subscription(id).await
    }
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager").finish_non_exhaustive()
    }
}
