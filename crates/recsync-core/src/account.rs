//! Account and permission statuses reported by a store, and the user
//! identities it lets callers discover.

use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// Whether the current caller has a usable account on the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountStatus {
    Available,
    Restricted,
    NoAccount,
    CouldNotDetermine,
}

/// Application-level permissions a caller can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    /// Lets other users look up the caller's identity.
    UserDiscoverability,
}

/// State of a [`Permission`] for the current caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    /// Never asked; the permission can still be requested.
    Pending,
    Granted,
    Denied,
    CouldNotComplete,
}

/// A user who has made themselves discoverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// The user's identity record.
    pub user_record_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

impl UserIdentity {
    pub fn new(user_record_id: RecordId) -> Self {
        Self {
            user_record_id,
            given_name: None,
            family_name: None,
        }
    }

    pub fn with_names(
        mut self,
        given_name: impl Into<String>,
        family_name: impl Into<String>,
    ) -> Self {
        self.given_name = Some(given_name.into());
        self.family_name = Some(family_name.into());
        self
    }

    /// Given and family name joined by a space, skipping missing parts.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}
