//! Save-policy evaluation against the stored copy of a record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use recsync_core::error::{ConflictError, NotFoundError};
use recsync_core::{
    Deletion, Error, FieldValue, Record, RecordReference, Result, SavePolicy, ServerStamp,
};

/// Server metadata for a write being applied.
pub(crate) struct WriteStamp {
    pub now: DateTime<Utc>,
    pub creator: RecordReference,
    pub change_tag: String,
}

/// Compute the new server copy for a submitted record.
///
/// Creation fields come from the existing copy when there is one and from
/// `stamp` otherwise; the modification date and change tag always come
/// from `stamp`.
pub(crate) fn apply_save(
    existing: Option<&Record>,
    submitted: &Record,
    policy: SavePolicy,
    stamp: WriteStamp,
) -> Result<Record> {
    let Some(existing) = existing else {
        return Ok(restamp(
            submitted,
            submitted.fields().clone(),
            ServerStamp {
                created_at: Some(stamp.now),
                creator: Some(stamp.creator),
                modified_at: Some(stamp.now),
                change_tag: Some(stamp.change_tag),
            },
        ));
    };

    let fields = match policy {
        SavePolicy::IfServerRecordUnchanged => {
            if submitted.change_tag() != existing.change_tag() {
                return Err(conflict(existing));
            }
            submitted.fields().clone()
        }
        SavePolicy::ChangedKeys => {
            let mut merged = existing.fields().clone();
            merged.extend(
                submitted
                    .fields()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
            merged
        }
        SavePolicy::AllKeys => submitted.fields().clone(),
    };

    Ok(restamp(
        existing,
        fields,
        ServerStamp {
            created_at: existing.created_at().copied(),
            creator: existing.creator().cloned(),
            modified_at: Some(stamp.now),
            change_tag: Some(stamp.change_tag),
        },
    ))
}

/// Check that a deletion may proceed against the stored copy.
pub(crate) fn check_delete(
    existing: Option<&Record>,
    deletion: &Deletion,
    policy: SavePolicy,
) -> Result<()> {
    let existing = existing.ok_or_else(|| NotFoundError::Record(deletion.id.to_string()))?;

    if policy == SavePolicy::IfServerRecordUnchanged
        && let Some(tag) = deletion.change_tag.as_deref()
        && existing.change_tag() != Some(tag)
    {
        return Err(conflict(existing));
    }

    Ok(())
}

fn conflict(existing: &Record) -> Error {
    ConflictError {
        record_name: existing.id().to_string(),
        server_change_tag: existing.change_tag().map(str::to_string),
    }
    .into()
}

fn restamp(
    base: &Record,
    fields: BTreeMap<String, FieldValue>,
    stamp: ServerStamp,
) -> Record {
    let mut record = Record::with_id(base.id().clone(), base.record_type().clone());
    for (key, value) in fields {
        record.set(key, value);
    }
    record.stamped(stamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recsync_core::{RecordId, RecordType};

    fn stamp(tag: &str) -> WriteStamp {
        WriteStamp {
            now: Utc::now(),
            creator: RecordReference::identity(RecordId::new("_me").unwrap()),
            change_tag: tag.to_string(),
        }
    }

    fn stored() -> Record {
        Record::with_id(RecordId::new("r1").unwrap(), RecordType::new("Note").unwrap())
            .with_field("title", "old")
            .with_field("body", "kept")
            .stamped(ServerStamp {
                created_at: Some(Utc::now()),
                change_tag: Some("t1".into()),
                ..ServerStamp::default()
            })
    }

    #[test]
    fn new_record_gets_server_metadata() {
        let submitted = Record::new(RecordType::new("Note").unwrap()).with_field("a", 1);
        let saved = apply_save(None, &submitted, SavePolicy::AllKeys, stamp("t0")).unwrap();
        assert_eq!(saved.change_tag(), Some("t0"));
        assert!(saved.created_at().is_some());
        assert_eq!(saved.creator().map(|c| c.id().as_str()), Some("_me"));
        assert_eq!(saved.get("a"), submitted.get("a"));
    }

    #[test]
    fn changed_keys_merges_fields() {
        let existing = stored();
        let submitted =
            Record::with_id(existing.id().clone(), existing.record_type().clone())
                .with_field("title", "new");
        let saved =
            apply_save(Some(&existing), &submitted, SavePolicy::ChangedKeys, stamp("t2")).unwrap();
        assert_eq!(saved.get("title").and_then(|v| v.as_str()), Some("new"));
        assert_eq!(saved.get("body").and_then(|v| v.as_str()), Some("kept"));
        assert_eq!(saved.created_at(), existing.created_at());
        assert_eq!(saved.change_tag(), Some("t2"));
    }

    #[test]
    fn all_keys_replaces_fields() {
        let existing = stored();
        let submitted =
            Record::with_id(existing.id().clone(), existing.record_type().clone())
                .with_field("title", "new");
        let saved =
            apply_save(Some(&existing), &submitted, SavePolicy::AllKeys, stamp("t2")).unwrap();
        assert!(saved.get("body").is_none());
    }

    #[test]
    fn unchanged_policy_rejects_stale_snapshot() {
        let existing = stored();
        let stale = Record::with_id(existing.id().clone(), existing.record_type().clone())
            .stamped(ServerStamp {
                change_tag: Some("t0".into()),
                ..ServerStamp::default()
            });
        let err = apply_save(
            Some(&existing),
            &stale,
            SavePolicy::IfServerRecordUnchanged,
            stamp("t2"),
        )
        .unwrap_err();
        match err {
            Error::Conflict(conflict) => {
                assert_eq!(conflict.server_change_tag.as_deref(), Some("t1"))
            }
            other => panic!("expected conflict, got {:?}", other),
        }

        let fresh = existing.clone().with_field("title", "edited");
        assert!(
            apply_save(
                Some(&existing),
                &fresh,
                SavePolicy::IfServerRecordUnchanged,
                stamp("t2")
            )
            .is_ok()
        );
    }

    #[test]
    fn delete_checks_tag_only_when_carried() {
        let existing = stored();
        let policy = SavePolicy::IfServerRecordUnchanged;

        let stale = Deletion {
            id: existing.id().clone(),
            change_tag: Some("t0".into()),
        };
        assert!(matches!(
            check_delete(Some(&existing), &stale, policy),
            Err(Error::Conflict(_))
        ));

        assert!(check_delete(Some(&existing), &Deletion::from(&existing), policy).is_ok());
        assert!(check_delete(Some(&existing), &Deletion::from(existing.id()), policy).is_ok());
        assert!(check_delete(Some(&existing), &stale, SavePolicy::AllKeys).is_ok());
    }

    #[test]
    fn delete_of_missing_record_is_not_found() {
        let deletion = Deletion::from(RecordId::new("ghost").unwrap());
        let err = check_delete(None, &deletion, SavePolicy::AllKeys).unwrap_err();
        assert!(matches!(err, Error::NotFound(NotFoundError::Record(ref n)) if n == "ghost"));
    }
}
