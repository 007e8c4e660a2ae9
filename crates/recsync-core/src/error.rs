//! Error types for recsync.
//!
//! This module provides a unified error type with explicit variants for
//! every failure a store can report: transport, authentication, missing
//! records or subscriptions, save-policy conflicts, permission and quota
//! rejections, malformed responses and local input validation.

use std::fmt;
use thiserror::Error;

/// The unified error type for recsync operations.
///
/// Every store operation reports failures through this type; none of them
/// panic. Callers that only care about the category can match on
/// [`Error::kind`].
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (missing token, no account, expired session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The requested record or subscription does not exist.
    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// The save policy rejected a write because the server copy changed.
    #[error("conflict: {0}")]
    Conflict(#[from] ConflictError),

    /// The store refused the operation for the current identity.
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// The store is throttling requests.
    #[error("rate limited{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    /// Protocol errors (unexpected status, malformed responses).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (invalid identifiers, mismatched cursors).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Some items of a mutation batch failed; inspect the per-item results.
    #[error("{failed} of {total} batch items failed")]
    PartialFailure { failed: usize, total: usize },
}

fn retry_hint(secs: &Option<u64>) -> String {
    match secs {
        Some(secs) => format!(", retry after {}s", secs),
        None => String::new(),
    }
}

/// Fieldless discriminant of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Auth,
    NotFound,
    Conflict,
    PermissionDenied,
    RateLimited,
    Protocol,
    InvalidInput,
    PartialFailure,
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Transport,
            Error::Auth(_) => ErrorKind::Auth,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Error::RateLimited { .. } => ErrorKind::RateLimited,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::PartialFailure { .. } => ErrorKind::PartialFailure,
        }
    }

    /// Shorthand for an [`InvalidInputError::Other`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(InvalidInputError::Other {
            message: message.into(),
        })
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credentials were configured for an authenticated call.
    #[error("no API token configured")]
    MissingToken,

    /// The token was rejected or has expired.
    #[error("token rejected{}", detail(.0))]
    TokenRejected(Option<String>),

    /// The account cannot be used for this store.
    #[error("account unavailable: {reason}")]
    AccountUnavailable { reason: String },
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(": {}", message),
        None => String::new(),
    }
}

/// What was missing.
#[derive(Debug, Error)]
pub enum NotFoundError {
    #[error("record '{0}'")]
    Record(String),

    #[error("subscription '{0}'")]
    Subscription(String),

    #[error("{0}")]
    Other(String),
}

/// A write rejected by the `IfServerRecordUnchanged` policy.
#[derive(Debug, Error)]
#[error("server copy of record '{record_name}' changed since it was fetched")]
pub struct ConflictError {
    /// The record whose server copy changed.
    pub record_name: String,
    /// The change tag currently held by the server, when reported.
    pub server_change_tag: Option<String>,
}

/// Protocol-level errors from store responses.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code (0 when the failure was not tied to a response).
    pub status: u16,
    /// Error code (if present).
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid record type name.
    #[error("invalid record type '{value}': {reason}")]
    RecordType { value: String, reason: String },

    /// Invalid record name.
    #[error("invalid record name '{value}': {reason}")]
    RecordId { value: String, reason: String },

    /// Invalid subscription identifier.
    #[error("invalid subscription id '{value}': {reason}")]
    SubscriptionId { value: String, reason: String },

    /// Invalid store URL.
    #[error("invalid store URL '{value}': {reason}")]
    StoreUrl { value: String, reason: String },

    /// A cursor was reused with a different query.
    #[error("cursor belongs to a different query")]
    CursorMismatch,

    /// Generic invalid input.
    #[error("{message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err: Error = NotFoundError::Record("abc".into()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = Error::RateLimited {
            retry_after_secs: Some(30),
        };
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.to_string(), "rate limited, retry after 30s");
    }

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::new(500, Some("InternalError".into()), Some("boom".into()));
        assert_eq!(err.to_string(), "HTTP 500 [InternalError]: boom");

        let err = ProtocolError::new(503, None, None);
        assert_eq!(err.to_string(), "HTTP 503");
    }

    #[test]
    fn conflict_names_record() {
        let err: Error = ConflictError {
            record_name: "note-1".into(),
            server_change_tag: None,
        }
        .into();
        assert!(err.to_string().contains("note-1"));
    }
}
