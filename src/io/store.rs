use std::path::PathBuf;
use std::time::Duration;

use crate::model::{ItemKind, LocalId, NewRecord, RecordPatch, Snapshot, StoreConfig};

use super::file_store::FileStore;
use super::http_store::HttpStore;

/// Error type for backend operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid store document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status} for {method} {url}")]
    Status {
        status: u16,
        method: &'static str,
        url: String,
    },
    #[error("{kind} {id} not found")]
    NotFound { kind: ItemKind, id: String },
    #[error("{0} has no server id")]
    Unresolved(LocalId),
}

/// The CRUD + reorder boundary to persistence, one collection per kind.
///
/// Calls block; the sync worker runs them off the UI thread.
pub trait RemoteStore: Send {
    fn load(&mut self) -> Result<Snapshot, StoreError>;
    /// Returns the new server id
    fn create(&mut self, kind: ItemKind, record: &NewRecord) -> Result<String, StoreError>;
    fn update(&mut self, kind: ItemKind, id: &str, patch: &RecordPatch) -> Result<(), StoreError>;
    fn remove(&mut self, kind: ItemKind, id: &str) -> Result<(), StoreError>;
    /// `ids` is the full new order of one collection
    fn reorder(
        &mut self,
        kind: ItemKind,
        parent_id: Option<&str>,
        ids: &[String],
    ) -> Result<(), StoreError>;
}

/// Open the backend named by the config
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn RemoteStore>, StoreError> {
    match config {
        StoreConfig::File { path } => Ok(Box::new(FileStore::open(path)?)),
        StoreConfig::Http {
            base_url,
            timeout_secs,
        } => Ok(Box::new(HttpStore::new(
            base_url,
            Duration::from_secs(*timeout_secs),
        )?)),
    }
}
