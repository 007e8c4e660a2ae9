//! Store URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated record store base URL.
///
/// This type ensures the URL is absolute, uses HTTPS (or HTTP for loopback
/// hosts), and is normalized for endpoint construction.
///
/// # Example
///
/// ```
/// use recsync_core::StoreUrl;
///
/// let store = StoreUrl::new("https://records.example.com").unwrap();
/// assert_eq!(store.endpoint("records.query"),
///            "https://records.example.com/api/records.query");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreUrl(Url);

impl StoreUrl {
    /// Create a new store URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::StoreUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        Ok(Self(url))
    }

    /// Returns the endpoint URL for a given API method.
    pub fn endpoint(&self, method: &str) -> String {
        // Url always renders a root path as "/", and a configured prefix
        // may or may not end in one.
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}/api/{}", base, method)
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        let fail = |reason: &str| -> Error {
            InvalidInputError::StoreUrl {
                value: original.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        if url.cannot_be_a_base() {
            return Err(fail("must be an absolute URL"));
        }

        let Some(host) = url.host_str() else {
            return Err(fail("must have a host"));
        };

        let is_loopback = matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1");
        let scheme = url.scheme();
        if scheme != "https" && !(scheme == "http" && is_loopback) {
            return Err(fail("must use HTTPS (HTTP allowed only for loopback hosts)"));
        }

        Ok(())
    }
}

impl fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StoreUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for StoreUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for StoreUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        StoreUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for StoreUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let store = StoreUrl::new("https://records.example.com").unwrap();
        assert_eq!(store.host(), Some("records.example.com"));
    }

    #[test]
    fn valid_loopback_http() {
        assert!(StoreUrl::new("http://localhost:8080").is_ok());
        assert!(StoreUrl::new("http://127.0.0.1:9000").is_ok());
    }

    #[test]
    fn endpoint_with_prefix() {
        let store = StoreUrl::new("https://example.com/tenant/").unwrap();
        assert_eq!(
            store.endpoint("records.modify"),
            "https://example.com/tenant/api/records.modify"
        );
    }

    #[test]
    fn invalid_http_remote() {
        assert!(StoreUrl::new("http://example.com").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(StoreUrl::new("/api/records.query").is_err());
    }
}
