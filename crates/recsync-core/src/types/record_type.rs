//! Record type name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::MAX_NAME_LEN;
use crate::error::{Error, InvalidInputError};

/// A validated record type name, such as `Post` or `Comment`.
///
/// Type names start with an ASCII letter and contain only ASCII letters,
/// digits and underscores.
///
/// # Example
///
/// ```
/// use recsync_core::RecordType;
///
/// let kind = RecordType::new("Comment").unwrap();
/// assert_eq!(kind.as_str(), "Comment");
/// assert!(RecordType::new("2fast").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordType(String);

impl RecordType {
    /// The type of identity records returned by identity resolution.
    pub const USERS: &'static str = "Users";

    /// Create a new record type, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, too long, or contains
    /// characters outside `[A-Za-z0-9_]`.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// The record type used for identity records.
    pub fn users() -> Self {
        Self(Self::USERS.to_string())
    }

    /// Returns the type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let fail = |reason: &str| -> Error {
            InvalidInputError::RecordType {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        let Some(first) = s.chars().next() else {
            return Err(fail("cannot be empty"));
        };

        if !first.is_ascii_alphabetic() {
            return Err(fail("must start with a letter"));
        }

        if let Some(c) = s.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
            return Err(fail(&format!("contains invalid character '{}'", c)));
        }

        if s.len() > MAX_NAME_LEN {
            return Err(fail("exceeds maximum length of 255 characters"));
        }

        Ok(())
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RecordType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RecordType> for String {
    fn from(kind: RecordType) -> Self {
        kind.0
    }
}

impl AsRef<str> for RecordType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
