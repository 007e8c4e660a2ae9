//! Queries, cursors and result pages.

mod predicate;

use crate::Result;
use crate::error::InvalidInputError;
use crate::record::Record;
use crate::types::RecordType;

pub use predicate::{Comparison, Predicate};

/// A query for records of one type.
///
/// A query without a cursor asks for the first page; [`Query::resume`]
/// produces the follow-up query for a server-issued [`Cursor`].
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    record_type: RecordType,
    predicate: Predicate,
    cursor: Option<Cursor>,
    limit: Option<u32>,
}

impl Query {
    pub fn new(record_type: RecordType, predicate: Predicate) -> Self {
        Self {
            record_type,
            predicate,
            cursor: None,
            limit: None,
        }
    }

    /// Set the page-size hint sent to the store.
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// The same query, continuing from `cursor`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::CursorMismatch`] if the cursor was
    /// issued for a different record type or predicate.
    pub fn resume(&self, cursor: Cursor) -> Result<Self> {
        if !cursor.belongs_to(self) {
            return Err(InvalidInputError::CursorMismatch.into());
        }
        Ok(Self {
            cursor: Some(cursor),
            ..self.clone()
        })
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Identity of the logical query, independent of the page.
    fn scope(&self) -> String {
        let predicate = serde_json::to_string(&self.predicate).unwrap_or_default();
        format!("{}|{}", self.record_type, predicate)
    }
}

/// An opaque continuation token for one logical query.
///
/// Cursors remember the query they were issued for; they cannot be
/// replayed against a different record type or predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    token: String,
    scope: String,
}

impl Cursor {
    /// Wrap a server-issued token for the query that produced it.
    pub fn new(token: impl Into<String>, query: &Query) -> Self {
        Self {
            token: token.into(),
            scope: query.scope(),
        }
    }

    /// The raw server token, for transports.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether this cursor continues `query`.
    pub fn belongs_to(&self, query: &Query) -> bool {
        self.scope == query.scope()
    }
}

/// One page of query results.
#[derive(Debug, Clone)]
pub struct QueryPage {
    /// The records in this page, in server order.
    pub records: Vec<Record>,

    /// Cursor for the next page, if more records exist.
    pub cursor: Option<Cursor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(name: &str) -> RecordType {
        RecordType::new(name).unwrap()
    }

    #[test]
    fn resume_keeps_query_and_sets_cursor() {
        let query = Query::new(kind("Post"), Predicate::eq("a", 1)).with_limit(Some(10));
        let cursor = Cursor::new("page-2", &query);
        let next = query.resume(cursor).unwrap();
        assert_eq!(next.cursor().map(Cursor::token), Some("page-2"));
        assert_eq!(next.limit(), Some(10));
        assert_eq!(next.predicate(), query.predicate());
    }

    #[test]
    fn cursor_rejected_for_other_predicate() {
        let query = Query::new(kind("Post"), Predicate::eq("a", 1));
        let cursor = Cursor::new("tok", &query);
        let other = Query::new(kind("Post"), Predicate::eq("a", 2));
        let err = other.resume(cursor).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::InvalidInput(InvalidInputError::CursorMismatch)
        ));
    }

    #[test]
    fn cursor_rejected_for_other_type() {
        let query = Query::new(kind("Post"), Predicate::all());
        let cursor = Cursor::new("tok", &query);
        assert!(!cursor.belongs_to(&Query::new(kind("Comment"), Predicate::all())));
    }

    #[test]
    fn limit_does_not_change_scope() {
        let query = Query::new(kind("Post"), Predicate::all());
        let cursor = Cursor::new("tok", &query);
        assert!(cursor.belongs_to(&query.clone().with_limit(Some(5))));
    }
}
