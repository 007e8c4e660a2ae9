//! Validated identifier types.
//!
//! These types enforce naming rules at construction time, so an invalid
//! record type, record name or subscription id never reaches a store.

mod record_id;
mod record_type;
mod store_url;
mod subscription_id;

pub use record_id::RecordId;
pub use record_type::RecordType;
pub use store_url::StoreUrl;
pub use subscription_id::SubscriptionId;

/// Maximum length shared by all identifier types.
pub(crate) const MAX_NAME_LEN: usize = 255;
