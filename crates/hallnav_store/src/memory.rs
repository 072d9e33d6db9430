use crate::{HallStore, Publisher, Result, StoreError, Subscription};
use async_trait::async_trait;
use hallnav_protocol::{HallDraft, HallEdit, HallId, HallRecord};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::debug;

/// Process-local hall collection.
#[derive(Debug)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<HallId, HallRecord>>,
    publisher: Publisher,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<HallRecord>) -> Self {
        let publisher = Publisher::new(records.clone());
        let docs = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            docs: Mutex::new(docs),
            publisher,
        }
    }

    fn with_docs<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<HallId, HallRecord>) -> Result<T>,
    ) -> Result<T> {
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| StoreError::backend("memory store lock poisoned"))?;
        let out = f(&mut docs)?;
        self.publisher
            .publish_if_changed(docs.values().cloned().collect());
        Ok(out)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HallStore for MemoryStore {
    async fn list(&self) -> Result<Vec<HallRecord>> {
        Ok(self.publisher.current().as_ref().clone())
    }

    async fn add(&self, draft: HallDraft) -> Result<HallRecord> {
        self.with_docs(|docs| {
            let record = HallRecord::from_draft(HallId::generate(), draft);
            docs.insert(record.id.clone(), record.clone());
            debug!("Added hall {} ({})", record.id, record.name);
            Ok(record)
        })
    }

    async fn update(&self, id: &HallId, edit: HallEdit) -> Result<HallRecord> {
        self.with_docs(|docs| {
            let record = docs
                .get_mut(id)
                .ok_or_else(|| StoreError::not_found(id.as_str()))?;
            record.apply(&edit);
            debug!("Updated hall {}", id);
            Ok(record.clone())
        })
    }

    async fn delete(&self, id: &HallId) -> Result<bool> {
        self.with_docs(|docs| Ok(docs.remove(id).is_some()))
    }

    fn subscribe(&self) -> Subscription {
        self.publisher.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_update_delete() {
        let store = MemoryStore::new();
        let hall = store
            .add(HallDraft::new("Room 204", "Block B", "Seminar room").unwrap())
            .await
            .unwrap();

        let updated = store
            .update(
                &hall.id,
                HallEdit {
                    description: Some("Computer lab".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description, "Computer lab");
        assert_eq!(updated.name, "Room 204");

        assert!(store.delete(&hall.id).await.unwrap());
        assert!(!store.delete(&hall.id).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(&HallId::new("nope"), HallEdit::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
