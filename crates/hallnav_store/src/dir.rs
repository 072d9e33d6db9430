//! Directory-backed hall collection.
//!
//! # Storage Format
//!
//! ```text
//! <root>/halls/
//! ├── {hall_id_1}.json
//! ├── {hall_id_2}.json
//! └── ...
//! ```
//!
//! Writes go through a temp file + rename so a concurrent reader never sees a
//! half-written document. Other processes may edit the directory; call
//! [`HallStore::refresh`] to pick their changes up.

use crate::{HallStore, Publisher, Result, StoreError, Subscription};
use async_trait::async_trait;
use hallnav_protocol::defaults::HALLS_COLLECTION;
use hallnav_protocol::{HallDraft, HallEdit, HallId, HallRecord};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Hall collection persisted as one JSON file per document.
#[derive(Debug, Clone)]
pub struct DirStore {
    inner: Arc<DirInner>,
}

#[derive(Debug)]
struct DirInner {
    dir: PathBuf,
    publisher: Publisher,
}

impl DirStore {
    /// Open (creating if needed) the collection under `root/halls`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let dir = root.as_ref().join(HALLS_COLLECTION);
        fs::create_dir_all(&dir)?;

        let records = load_all(&dir)?;
        debug!("Loaded {} halls from {}", records.len(), dir.display());

        Ok(Self {
            inner: Arc::new(DirInner {
                dir,
                publisher: Publisher::new(records),
            }),
        })
    }

    /// Directory holding the documents.
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DirInner) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| StoreError::backend(format!("store task failed: {e}")))?
    }
}

impl DirInner {
    fn doc_path(&self, id: &HallId) -> Result<PathBuf> {
        let valid = !id.as_str().is_empty()
            && id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::not_found(id.as_str()));
        }
        Ok(self.dir.join(format!("{}.json", id.as_str())))
    }

    fn load(&self, id: &HallId) -> Result<Option<HallRecord>> {
        let path = self.doc_path(id)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(read_doc(&path)?))
    }

    fn save(&self, record: &HallRecord) -> Result<()> {
        let path = self.doc_path(&record.id)?;
        let json = serde_json::to_string_pretty(record)?;
        atomic_write(&path, json.as_bytes())?;
        debug!("Saved hall {} to {}", record.id, path.display());
        Ok(())
    }

    fn rescan(&self) -> Result<bool> {
        let records = load_all(&self.dir)?;
        Ok(self.publisher.publish_if_changed(records))
    }
}

#[async_trait]
impl HallStore for DirStore {
    async fn list(&self) -> Result<Vec<HallRecord>> {
        self.blocking(|inner| load_all(&inner.dir)).await
    }

    async fn add(&self, draft: HallDraft) -> Result<HallRecord> {
        self.blocking(move |inner| {
            let record = HallRecord::from_draft(HallId::generate(), draft);
            inner.save(&record)?;
            inner.rescan()?;
            Ok(record)
        })
        .await
    }

    async fn update(&self, id: &HallId, edit: HallEdit) -> Result<HallRecord> {
        let id = id.clone();
        self.blocking(move |inner| {
            let mut record = inner
                .load(&id)?
                .ok_or_else(|| StoreError::not_found(id.as_str()))?;
            record.apply(&edit);
            inner.save(&record)?;
            inner.rescan()?;
            Ok(record)
        })
        .await
    }

    async fn delete(&self, id: &HallId) -> Result<bool> {
        let id = id.clone();
        self.blocking(move |inner| {
            let path = inner.doc_path(&id)?;
            if !path.exists() {
                return Ok(false);
            }
            fs::remove_file(&path)?;
            debug!("Deleted hall {} from {}", id, path.display());
            inner.rescan()?;
            Ok(true)
        })
        .await
    }

    fn subscribe(&self) -> Subscription {
        self.inner.publisher.subscribe()
    }

    async fn refresh(&self) -> Result<()> {
        let changed = self.blocking(|inner| inner.rescan()).await?;
        if changed {
            debug!("Picked up external changes in {}", self.inner.dir.display());
        }
        Ok(())
    }
}

fn read_doc(path: &Path) -> Result<HallRecord> {
    let json = fs::read_to_string(path)?;
    let mut record: HallRecord = serde_json::from_str(&json)?;
    // The file name is authoritative for the id.
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        record.id = HallId::new(stem);
    }
    Ok(record)
}

fn load_all(dir: &Path) -> Result<Vec<HallRecord>> {
    let mut records = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_doc(&path) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping unreadable hall document {}: {}", path.display(), e),
        }
    }

    Ok(records)
}

/// Atomic write via temp file + rename
fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let temp_path = parent.join(format!(".tmp_{}", uuid::Uuid::new_v4()));
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_add_and_reopen() {
        let temp = TempDir::new().unwrap();
        let store = DirStore::open(temp.path()).unwrap();

        let hall = store
            .add(HallDraft::new("LT1 & 2", "North", "Theatre").unwrap())
            .await
            .unwrap();
        assert!(store.dir().join(format!("{}.json", hall.id)).exists());

        let reopened = DirStore::open(temp.path()).unwrap();
        let halls = reopened.list().await.unwrap();
        assert_eq!(halls.len(), 1);
        assert_eq!(halls[0].id, hall.id);
        assert_eq!(halls[0].name, "LT1 & 2");
    }

    #[tokio::test]
    async fn test_unreadable_document_skipped() {
        let temp = TempDir::new().unwrap();
        let store = DirStore::open(temp.path()).unwrap();
        fs::write(store.dir().join("broken.json"), "{not json").unwrap();
        fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_sees_external_write() {
        let temp = TempDir::new().unwrap();
        let store = DirStore::open(temp.path()).unwrap();
        let mut sub = store.subscribe();
        assert!(sub.next().await.unwrap().is_empty());

        // Written by "another client".
        fs::write(
            store.dir().join("ext1.json"),
            r#"{"id":"ignored","name":"LT3 & 4","location":"East","description":"Theatre","capacity":200}"#,
        )
        .unwrap();
        store.refresh().await.unwrap();

        let snap = sub.next().await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].id.as_str(), "ext1");
        assert_eq!(snap[0].capacity, Some(200));
    }

    #[tokio::test]
    async fn test_path_like_ids_rejected() {
        let temp = TempDir::new().unwrap();
        let store = DirStore::open(temp.path()).unwrap();
        let err = store.delete(&HallId::new("../config")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_missing() {
        let temp = TempDir::new().unwrap();
        let store = DirStore::open(temp.path()).unwrap();
        let err = store
            .update(&HallId::new("missing"), HallEdit::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
