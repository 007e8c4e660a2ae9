//! Record name (unique record identifier).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::MAX_NAME_LEN;
use crate::error::{Error, InvalidInputError};

/// The unique name of a record within a store.
///
/// Names are chosen by the client (new records get a random UUID) and are
/// non-empty, at most 255 bytes, and free of whitespace and control
/// characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Create a record name from a string, validating the format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Generate a fresh random record name.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the record name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let reason = if s.is_empty() {
            "cannot be empty"
        } else if s.len() > MAX_NAME_LEN {
            "exceeds maximum length of 255 bytes"
        } else if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            "cannot contain whitespace or control characters"
        } else {
            return Ok(());
        };

        Err(InvalidInputError::RecordId {
            value: s.to_string(),
            reason: reason.to_string(),
        }
        .into())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_are_valid_and_unique() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        assert!(RecordId::new(a.as_str()).is_ok());
    }

    #[test]
    fn rejects_whitespace() {
        assert!(RecordId::new("two words").is_err());
        assert!(RecordId::new("tab\there").is_err());
        assert!(RecordId::new("").is_err());
    }

    #[test]
    fn accepts_punctuation() {
        assert!(RecordId::new("_defaultOwner").is_ok());
        assert!(RecordId::new("post-2024.01:a").is_ok());
    }
}
