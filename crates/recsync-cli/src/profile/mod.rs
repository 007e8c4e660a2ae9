//! Connection profile for the CLI.

pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use recsync::{ApiToken, ClientConfig, RecordClient, StoreUrl};
use recsync_http::HttpStore;

/// Overrides the stored endpoint.
pub const ENDPOINT_VAR: &str = "RECSYNC_ENDPOINT";

/// Overrides the stored token.
pub const TOKEN_VAR: &str = "RECSYNC_TOKEN";

/// Where to reach the store and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl Profile {
    /// Load the stored profile with environment overrides applied.
    pub fn resolve() -> Result<Profile> {
        let stored = storage::load_profile().context("Failed to load profile")?;
        let endpoint = std::env::var(ENDPOINT_VAR).ok();
        let token = std::env::var(TOKEN_VAR).ok();

        Self::merge(stored, endpoint, token)
            .context("No profile configured. Run 'recsync configure' first.")
    }

    fn merge(
        stored: Option<Profile>,
        endpoint: Option<String>,
        token: Option<String>,
    ) -> Option<Profile> {
        let mut profile = match (stored, endpoint.clone()) {
            (Some(profile), _) => profile,
            (None, Some(endpoint)) => Profile {
                endpoint,
                token: None,
                page_size: None,
            },
            (None, None) => return None,
        };

        if let Some(endpoint) = endpoint {
            profile.endpoint = endpoint;
        }
        if token.is_some() {
            profile.token = token;
        }
        Some(profile)
    }

    /// Build a record client against this profile's store.
    pub fn connect(&self) -> Result<RecordClient> {
        let url = StoreUrl::new(&self.endpoint).context("Invalid store endpoint")?;

        let mut builder = HttpStore::builder(url);
        if let Some(token) = &self.token {
            builder = builder.token(ApiToken::new(token.as_str()));
        }
        let store = builder.build().context("Failed to create store client")?;

        let config = ClientConfig {
            page_size: self.page_size,
            ..ClientConfig::default()
        };
        Ok(RecordClient::with_config(Arc::new(store), config))
    }
}
