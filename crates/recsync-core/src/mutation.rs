//! Batched record mutation types.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::record::Record;
use crate::types::RecordId;

/// How a store reconciles a submitted record with its own copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SavePolicy {
    /// Reject the write with a conflict if the server copy's change tag
    /// differs from the one the submitted snapshot (or deletion) carries.
    IfServerRecordUnchanged,

    /// Overwrite regardless of server state, writing only the submitted
    /// fields and keeping any others the server copy has.
    ChangedKeys,

    /// Overwrite regardless of server state, replacing every field.
    AllKeys,
}

/// Scheduling hint passed along with a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// A record scheduled for deletion.
///
/// Deletions built from a fetched [`Record`] carry its change tag, which
/// the `IfServerRecordUnchanged` policy checks. Deletions built from a bare
/// [`RecordId`] carry none and are applied unconditionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    pub id: RecordId,
    pub change_tag: Option<String>,
}

impl From<RecordId> for Deletion {
    fn from(id: RecordId) -> Self {
        Self {
            id,
            change_tag: None,
        }
    }
}

impl From<&RecordId> for Deletion {
    fn from(id: &RecordId) -> Self {
        id.clone().into()
    }
}

impl From<&Record> for Deletion {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id().clone(),
            change_tag: record.change_tag().map(str::to_string),
        }
    }
}

/// An ordered set of saves and deletions submitted in one round trip.
#[derive(Debug, Clone)]
pub struct MutationBatch {
    saves: Vec<Record>,
    deletions: Vec<Deletion>,
    policy: SavePolicy,
    priority: Priority,
}

impl MutationBatch {
    pub fn new(policy: SavePolicy) -> Self {
        Self {
            saves: Vec::new(),
            deletions: Vec::new(),
            policy,
            priority: Priority::default(),
        }
    }

    pub fn save(mut self, record: Record) -> Self {
        self.saves.push(record);
        self
    }

    pub fn save_all(mut self, records: impl IntoIterator<Item = Record>) -> Self {
        self.saves.extend(records);
        self
    }

    pub fn delete(mut self, deletion: impl Into<Deletion>) -> Self {
        self.deletions.push(deletion.into());
        self
    }

    pub fn delete_all<D: Into<Deletion>>(mut self, deletions: impl IntoIterator<Item = D>) -> Self {
        self.deletions.extend(deletions.into_iter().map(Into::into));
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn saves(&self) -> &[Record] {
        &self.saves
    }

    pub fn deletions(&self) -> &[Deletion] {
        &self.deletions
    }

    pub fn policy(&self) -> SavePolicy {
        self.policy
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Total number of items (saves plus deletions).
    pub fn len(&self) -> usize {
        self.saves.len() + self.deletions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a successful batch item did.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemChange {
    /// The record was written; carries the server's new snapshot.
    Saved(Record),
    /// The record was removed.
    Deleted,
}

/// The outcome of one item in a mutation batch.
#[derive(Debug)]
pub struct ItemResult {
    pub id: RecordId,
    pub outcome: Result<ItemChange>,
}

impl ItemResult {
    pub fn saved(record: Record) -> Self {
        Self {
            id: record.id().clone(),
            outcome: Ok(ItemChange::Saved(record)),
        }
    }

    pub fn deleted(id: RecordId) -> Self {
        Self {
            id,
            outcome: Ok(ItemChange::Deleted),
        }
    }

    pub fn failed(id: RecordId, error: crate::Error) -> Self {
        Self {
            id,
            outcome: Err(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ServerStamp;
    use crate::types::RecordType;

    #[test]
    fn deletion_from_record_carries_change_tag() {
        let record = Record::new(RecordType::new("Post").unwrap()).stamped(ServerStamp {
            change_tag: Some("v3".into()),
            ..ServerStamp::default()
        });
        let deletion = Deletion::from(&record);
        assert_eq!(deletion.change_tag.as_deref(), Some("v3"));
        assert_eq!(&deletion.id, record.id());

        let bare = Deletion::from(record.id());
        assert!(bare.change_tag.is_none());
    }

    #[test]
    fn batch_counts_items() {
        let kind = RecordType::new("Post").unwrap();
        let batch = MutationBatch::new(SavePolicy::AllKeys)
            .save(Record::new(kind.clone()))
            .delete(RecordId::generate())
            .delete_all([RecordId::generate(), RecordId::generate()])
            .with_priority(Priority::High);
        assert_eq!(batch.len(), 4);
        assert_eq!(batch.saves().len(), 1);
        assert_eq!(batch.priority(), Priority::High);
        assert!(MutationBatch::new(SavePolicy::AllKeys).is_empty());
    }
}
