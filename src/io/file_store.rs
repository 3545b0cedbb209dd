use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::model::{ItemKind, NewRecord, RecordPatch, RemoteRecord, Snapshot};

use super::store::{RemoteStore, StoreError};

/// On-disk layout of the JSON store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    records: IndexMap<ItemKind, Vec<RemoteRecord>>,
}

/// A backend that keeps everything in one JSON file, rewritten atomically
/// after every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    doc: Document,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let doc = if path.exists() {
            let text = fs::read_to_string(path).map_err(|e| StoreError::ReadError {
                path: path.to_path_buf(),
                source: e,
            })?;
            if text.trim().is_empty() {
                Document::default()
            } else {
                serde_json::from_str(&text)?
            }
        } else {
            Document::default()
        };
        Ok(FileStore {
            path: path.to_path_buf(),
            doc,
        })
    }

    fn save(&self) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(&self.doc)?;
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|e| StoreError::WriteError {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        atomic_write(&self.path, &content).map_err(|e| StoreError::WriteError {
            path: self.path.clone(),
            source: e,
        })
    }

    fn records_mut(&mut self, kind: ItemKind) -> &mut Vec<RemoteRecord> {
        self.doc.records.entry(kind).or_default()
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Reassign `order` 0.. to the siblings under `parent_id`, following `ids`.
fn renumber_siblings(records: &mut [RemoteRecord], parent_id: Option<&str>, ids: &[String]) {
    for record in records.iter_mut() {
        if record.parent_id.as_deref() != parent_id {
            continue;
        }
        if let Some(pos) = ids.iter().position(|id| *id == record.id) {
            record.order = pos as i64;
        }
    }
}

/// Sibling ids sorted by their current order
fn sibling_ids(records: &[RemoteRecord], parent_id: Option<&str>) -> Vec<String> {
    let mut siblings: Vec<&RemoteRecord> = records
        .iter()
        .filter(|r| r.parent_id.as_deref() == parent_id)
        .collect();
    siblings.sort_by_key(|r| r.order);
    siblings.into_iter().map(|r| r.id.clone()).collect()
}

impl RemoteStore for FileStore {
    fn load(&mut self) -> Result<Snapshot, StoreError> {
        Ok(Snapshot {
            records: self.doc.records.clone(),
        })
    }

    fn create(&mut self, kind: ItemKind, record: &NewRecord) -> Result<String, StoreError> {
        self.doc.next_id += 1;
        let id = format!("{}-{}", kind.endpoint(), self.doc.next_id);
        let parent_id = record.parent_id.clone();

        let records = self.records_mut(kind);
        let mut order = sibling_ids(records, parent_id.as_deref());
        let at = usize::try_from(record.order).unwrap_or(0).min(order.len());
        order.insert(at, id.clone());
        records.push(RemoteRecord {
            id: id.clone(),
            parent_id: parent_id.clone(),
            order: 0,
            completed: record.completed,
            fields: record.fields.clone(),
        });
        renumber_siblings(records, parent_id.as_deref(), &order);

        self.save()?;
        Ok(id)
    }

    fn update(&mut self, kind: ItemKind, id: &str, patch: &RecordPatch) -> Result<(), StoreError> {
        let record = self
            .records_mut(kind)
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.to_string(),
            })?;
        if let Some(completed) = patch.completed {
            record.completed = completed;
        }
        for (field, value) in &patch.fields {
            record.fields.insert(*field, value.clone());
        }
        self.save()
    }

    fn remove(&mut self, kind: ItemKind, id: &str) -> Result<(), StoreError> {
        let records = self.records_mut(kind);
        let pos = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.to_string(),
            })?;
        let removed = records.remove(pos);
        let order = sibling_ids(records, removed.parent_id.as_deref());
        renumber_siblings(records, removed.parent_id.as_deref(), &order);

        // Tasks go with their parent
        if let Some(child_kind) = kind.child_kind() {
            self.records_mut(child_kind)
                .retain(|r| r.parent_id.as_deref() != Some(id));
        }
        self.save()
    }

    fn reorder(
        &mut self,
        kind: ItemKind,
        parent_id: Option<&str>,
        ids: &[String],
    ) -> Result<(), StoreError> {
        let records = self.records_mut(kind);
        if let Some(missing) = ids.iter().find(|id| {
            !records
                .iter()
                .any(|r| r.id == **id && r.parent_id.as_deref() == parent_id)
        }) {
            return Err(StoreError::NotFound {
                kind,
                id: missing.clone(),
            });
        }
        renumber_siblings(records, parent_id, ids);
        self.save()
    }
}
