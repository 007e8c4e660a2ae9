//! Subscription identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::MAX_NAME_LEN;
use crate::error::{Error, InvalidInputError};

/// The caller-chosen identifier of a push-notification subscription.
///
/// Saving a subscription under an id that already exists replaces the
/// previous registration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Create a subscription id, validating the format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        if s.is_empty() || s.len() > MAX_NAME_LEN || s.chars().any(char::is_whitespace) {
            return Err(InvalidInputError::SubscriptionId {
                value: s,
                reason: "must be 1-255 bytes without whitespace".to_string(),
            }
            .into());
        }
        Ok(Self(s))
    }

    /// Returns the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubscriptionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SubscriptionId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SubscriptionId> for String {
    fn from(id: SubscriptionId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates() {
        assert!(SubscriptionId::new("new-comments").is_ok());
        assert!(SubscriptionId::new("").is_err());
        assert!(SubscriptionId::new("new comments").is_err());
    }
}
