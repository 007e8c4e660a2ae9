//! Push-notification subscription types.

use serde::{Deserialize, Serialize};

use crate::query::Predicate;
use crate::types::{RecordType, SubscriptionId};

/// Which record changes fire a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionTriggers {
    pub on_create: bool,
    pub on_update: bool,
    pub on_delete: bool,
}

impl SubscriptionTriggers {
    pub fn all() -> Self {
        Self {
            on_create: true,
            on_update: true,
            on_delete: true,
        }
    }

    pub fn on_create() -> Self {
        Self {
            on_create: true,
            on_update: false,
            on_delete: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.on_create || self.on_update || self.on_delete)
    }
}

impl Default for SubscriptionTriggers {
    fn default() -> Self {
        Self::all()
    }
}

/// Payload configuration of the notifications a subscription produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationInfo {
    /// Text shown to the user, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_body: Option<String>,

    /// Deliver a silent, content-available notification.
    #[serde(default)]
    pub content_available: bool,

    /// Record fields to include in the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_keys: Option<Vec<String>>,
}

/// A query subscription registered with the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "subscriptionId")]
    id: SubscriptionId,
    record_type: RecordType,
    predicate: Predicate,
    #[serde(default)]
    triggers: SubscriptionTriggers,
    #[serde(default)]
    notification: NotificationInfo,
}

impl Subscription {
    /// Create a subscription firing on every change, with an empty payload.
    pub fn new(id: SubscriptionId, record_type: RecordType, predicate: Predicate) -> Self {
        Self {
            id,
            record_type,
            predicate,
            triggers: SubscriptionTriggers::default(),
            notification: NotificationInfo::default(),
        }
    }

    pub fn with_triggers(mut self, triggers: SubscriptionTriggers) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn with_notification(mut self, notification: NotificationInfo) -> Self {
        self.notification = notification;
        self
    }

    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn triggers(&self) -> SubscriptionTriggers {
        self.triggers
    }

    pub fn notification(&self) -> &NotificationInfo {
        &self.notification
    }
}
