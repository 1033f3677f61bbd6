//! Realtime change events
//!
//! A change event names the collection that changed, the kind of change, and
//! (when the backend supplies them) the affected row id and the new record.
//! `Resync` carries no identity and asks the consumer to re-fetch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::models::{Collection, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Feed (re)connected; state may have been missed
    Resync,
}

impl ChangeKind {
    /// Parse the backend's `INSERT` / `UPDATE` / `DELETE` tag
    pub fn from_backend(tag: &str) -> Option<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "INSERT" => Some(ChangeKind::Insert),
            "UPDATE" => Some(ChangeKind::Update),
            "DELETE" => Some(ChangeKind::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "insert"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Delete => write!(f, "delete"),
            ChangeKind::Resync => write!(f, "resync"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<RecordId>,
    /// New row for insert / update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Value>,
    /// Previous row (only the primary key unless the table has full replica identity)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_record: Option<Value>,
}

impl ChangeEvent {
    pub fn resync(collection: Collection) -> Self {
        Self {
            collection,
            kind: ChangeKind::Resync,
            row_id: None,
            record: None,
            old_record: None,
        }
    }

    pub fn inserted(collection: Collection, record: Value) -> Self {
        Self::with_record(collection, ChangeKind::Insert, Some(record), None)
    }

    pub fn updated(collection: Collection, record: Value) -> Self {
        Self::with_record(collection, ChangeKind::Update, Some(record), None)
    }

    pub fn deleted(collection: Collection, old_record: Value) -> Self {
        Self::with_record(collection, ChangeKind::Delete, None, Some(old_record))
    }

    /// Build an event, taking the row id from `record` or else `old_record`
    pub fn with_record(
        collection: Collection,
        kind: ChangeKind,
        record: Option<Value>,
        old_record: Option<Value>,
    ) -> Self {
        let row_id = [record.as_ref(), old_record.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|r| r.get("id"))
            .and_then(|id| serde_json::from_value::<RecordId>(id.clone()).ok());
        Self {
            collection,
            kind,
            row_id,
            record,
            old_record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_id_from_record_or_old_record() {
        let ev = ChangeEvent::updated(Collection::Orders, json!({"id": 7, "pagado": true}));
        assert_eq!(ev.row_id, Some(RecordId::from(7)));

        let ev = ChangeEvent::deleted(Collection::Orders, json!({"id": "abc"}));
        assert_eq!(ev.row_id, Some(RecordId::new("abc")));
        assert!(ev.record.is_none());

        let ev = ChangeEvent::deleted(Collection::Orders, json!({}));
        assert_eq!(ev.row_id, None);
    }

    #[test]
    fn test_backend_tags() {
        assert_eq!(ChangeKind::from_backend("INSERT"), Some(ChangeKind::Insert));
        assert_eq!(ChangeKind::from_backend("delete"), Some(ChangeKind::Delete));
        assert_eq!(ChangeKind::from_backend("TRUNCATE"), None);
    }
}
