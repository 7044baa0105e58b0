use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{sort_newest_first, stamp_for_save, StoreError, TemplateStore};
use crate::models::TemplateRecord;

/// In-process template store
///
/// Backs tests and the CLI when no remote store is configured.
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    records: RwLock<HashMap<String, TemplateRecord>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl TemplateStore for MemoryTemplateStore {
    async fn save(&self, record: TemplateRecord) -> Result<TemplateRecord, StoreError> {
        let record = stamp_for_save(record);
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());

        tracing::debug!("Saved template {} ({}) in memory", record.id, record.name);

        Ok(record)
    }

    async fn load(&self, id: &str) -> Result<TemplateRecord, StoreError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id))
    }

    async fn list_owned_by(&self, owner_id: &str) -> Result<Vec<TemplateRecord>, StoreError> {
        let mut records: Vec<TemplateRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn list_public(&self, limit: usize) -> Result<Vec<TemplateRecord>, StoreError> {
        let mut records: Vec<TemplateRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.is_public)
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        records.truncate(limit);
        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        match self.records.write().await.remove(id) {
            Some(_) => {
                tracing::debug!("Deleted template {} from memory", id);
                Ok(())
            }
            None => Err(StoreError::not_found(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::test_support::record;

    #[tokio::test]
    async fn test_save_assigns_id_and_loads_back() {
        let store = MemoryTemplateStore::new();
        let saved = store.save(record("alice", "dip", false, 0)).await.unwrap();

        assert!(saved.is_persisted());
        assert_eq!(store.load(&saved.id).await.unwrap(), saved);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_resave_overwrites_same_id() {
        let store = MemoryTemplateStore::new();
        let mut saved = store.save(record("alice", "dip", false, 0)).await.unwrap();
        saved.code = "print('v2')".to_string();
        let resaved = store.save(saved.clone()).await.unwrap();

        assert_eq!(resaved.id, saved.id);
        assert_eq!(resaved.created_at, saved.created_at);
        assert!(resaved.updated_at >= saved.updated_at);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.load(&saved.id).await.unwrap().code, "print('v2')");
    }

    #[tokio::test]
    async fn test_missing_record() {
        let store = MemoryTemplateStore::new();
        assert!(store.load("nope").await.unwrap_err().is_not_found());
        assert!(store.delete("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_listing_visibility_and_order() {
        let store = MemoryTemplateStore::new();
        let old_public = store.save(record("alice", "old", true, 30)).await.unwrap();
        let private = store.save(record("alice", "private", false, 20)).await.unwrap();
        let new_public = store.save(record("bob", "new", true, 10)).await.unwrap();

        let public = store.list_public(10).await.unwrap();
        let public_ids: Vec<&str> = public.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(public_ids, vec![new_public.id.as_str(), old_public.id.as_str()]);

        assert_eq!(store.list_public(1).await.unwrap().len(), 1);
        assert!(store.list_public(0).await.unwrap().is_empty());

        let alice: Vec<String> = store
            .list_owned_by("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(alice, vec![private.id.clone(), old_public.id.clone()]);

        let bob = store.list_owned_by("bob").await.unwrap();
        assert!(bob.iter().all(|r| r.id != private.id));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryTemplateStore::new();
        let saved = store.save(record("alice", "dip", true, 0)).await.unwrap();
        store.delete(&saved.id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(store.list_public(10).await.unwrap().is_empty());
    }
}
