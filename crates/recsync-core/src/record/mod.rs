//! Records, references and field values.

mod field_value;

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{RecordId, RecordType};

pub use field_value::FieldValue;

/// Predicate key for a record's name.
pub const RECORD_NAME_KEY: &str = "recordName";
/// Predicate key for the server-assigned creation timestamp.
pub const CREATION_DATE_KEY: &str = "creationDate";
/// Predicate key for the last server-side modification timestamp.
pub const MODIFICATION_DATE_KEY: &str = "modificationDate";
/// Predicate key for the reference to the creating identity.
pub const CREATOR_KEY: &str = "creatorUserRecordID";

/// A weak, by-value pointer to another record.
///
/// Holding a reference never keeps the target alive; it is used purely
/// for filtering and lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordReference {
    #[serde(rename = "recordName")]
    id: RecordId,
    record_type: RecordType,
}

impl RecordReference {
    pub fn new(id: RecordId, record_type: RecordType) -> Self {
        Self { id, record_type }
    }

    /// A reference to an identity record.
    pub fn identity(id: RecordId) -> Self {
        Self::new(id, RecordType::users())
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }
}

/// Server-maintained record metadata.
///
/// Stores attach this to the snapshots they return; clients never set it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerStamp {
    pub created_at: Option<DateTime<Utc>>,
    pub creator: Option<RecordReference>,
    pub modified_at: Option<DateTime<Utc>>,
    pub change_tag: Option<String>,
}

/// An immutable-by-convention snapshot of a stored record.
///
/// Records returned by a store describe the server state at the time of
/// the call. To change a record, edit the returned snapshot with
/// [`Record::set`] and submit it back; the change tag it carries lets the
/// `IfServerRecordUnchanged` policy detect intervening writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(rename = "recordName")]
    id: RecordId,

    record_type: RecordType,

    #[serde(default)]
    fields: BTreeMap<String, FieldValue>,

    #[serde(rename = "creationDate", default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,

    #[serde(rename = "creatorUserRecordID", default, skip_serializing_if = "Option::is_none")]
    creator: Option<RecordReference>,

    #[serde(rename = "modificationDate", default, skip_serializing_if = "Option::is_none")]
    modified_at: Option<DateTime<Utc>>,

    #[serde(rename = "recordChangeTag", default, skip_serializing_if = "Option::is_none")]
    change_tag: Option<String>,
}

impl Record {
    /// Create a new, never-saved record with a generated name.
    pub fn new(record_type: RecordType) -> Self {
        Self::with_id(RecordId::generate(), record_type)
    }

    /// Create a new, never-saved record with a chosen name.
    pub fn with_id(id: RecordId, record_type: RecordType) -> Self {
        Self {
            id,
            record_type,
            fields: BTreeMap::new(),
            created_at: None,
            creator: None,
            modified_at: None,
            change_tag: None,
        }
    }

    /// Builder-style field assignment.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Attach server metadata to this snapshot.
    pub fn stamped(mut self, stamp: ServerStamp) -> Self {
        self.created_at = stamp.created_at;
        self.creator = stamp.creator;
        self.modified_at = stamp.modified_at;
        self.change_tag = stamp.change_tag;
        self
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Set a user field, returning the previous value.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    pub fn created_at(&self) -> Option<&DateTime<Utc>> {
        self.created_at.as_ref()
    }

    pub fn creator(&self) -> Option<&RecordReference> {
        self.creator.as_ref()
    }

    pub fn modified_at(&self) -> Option<&DateTime<Utc>> {
        self.modified_at.as_ref()
    }

    /// The server's version tag for this snapshot, if it was ever saved.
    pub fn change_tag(&self) -> Option<&str> {
        self.change_tag.as_deref()
    }

    /// A reference pointing at this record.
    pub fn reference(&self) -> RecordReference {
        RecordReference::new(self.id.clone(), self.record_type.clone())
    }

    /// Resolve a predicate key, including the system keys.
    pub fn lookup(&self, key: &str) -> Option<Cow<'_, FieldValue>> {
        match key {
            RECORD_NAME_KEY => Some(Cow::Owned(FieldValue::String(self.id.to_string()))),
            CREATION_DATE_KEY => self.created_at.map(|d| Cow::Owned(FieldValue::Date(d))),
            MODIFICATION_DATE_KEY => self.modified_at.map(|d| Cow::Owned(FieldValue::Date(d))),
            CREATOR_KEY => self
                .creator
                .clone()
                .map(|r| Cow::Owned(FieldValue::Reference(r))),
            _ => self.fields.get(key).map(Cow::Borrowed),
        }
    }
}

impl From<&Record> for RecordReference {
    fn from(record: &Record) -> Self {
        record.reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn comment() -> Record {
        Record::with_id(
            RecordId::new("c1").unwrap(),
            RecordType::new("Comment").unwrap(),
        )
        .with_field("text", "nice post")
    }

    #[test]
    fn lookup_resolves_system_keys() {
        let created = Utc.with_ymd_and_hms(2017, 6, 20, 0, 15, 0).unwrap();
        let owner = RecordReference::identity(RecordId::new("u1").unwrap());
        let record = comment().stamped(ServerStamp {
            created_at: Some(created),
            creator: Some(owner.clone()),
            modified_at: None,
            change_tag: Some("t1".into()),
        });

        assert_eq!(
            record.lookup(CREATION_DATE_KEY).unwrap().as_date(),
            Some(&created)
        );
        assert_eq!(
            record.lookup(CREATOR_KEY).unwrap().as_reference(),
            Some(&owner)
        );
        assert_eq!(record.lookup("text").unwrap().as_str(), Some("nice post"));
        assert!(record.lookup(MODIFICATION_DATE_KEY).is_none());
        assert_eq!(record.change_tag(), Some("t1"));
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_value(comment()).unwrap();
        assert_eq!(
            json,
            json!({
                "recordName": "c1",
                "recordType": "Comment",
                "fields": {"text": {"type": "string", "value": "nice post"}}
            })
        );
    }

    #[test]
    fn new_records_get_unique_names() {
        let kind = RecordType::new("Post").unwrap();
        assert_ne!(Record::new(kind.clone()).id(), Record::new(kind).id());
    }
}
