use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::item::{Fields, ItemKind};

/// An item as the backend stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub fields: Fields,
}

/// Payload for a create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub order: i64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub fields: Fields,
}

/// Payload for an update. Only set members are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: Fields,
}

impl RecordPatch {
    pub fn completed(completed: bool) -> Self {
        RecordPatch {
            completed: Some(completed),
            fields: Fields::new(),
        }
    }
}

/// Everything loaded at startup, keyed by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub records: IndexMap<ItemKind, Vec<RemoteRecord>>,
}

impl Snapshot {
    pub fn records(&self, kind: ItemKind) -> &[RemoteRecord] {
        self.records.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}
