// Template persistence: the store boundary and its in-process / Redis adapters
pub mod memory;
pub mod redis_store;

pub use memory::MemoryTemplateStore;
pub use redis_store::RedisTemplateStore;

use std::future::Future;

use crate::models::{store_timestamp, TemplateRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("template {id} not found")]
    NotFound { id: String },
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("template document error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(id: &str) -> Self {
        StoreError::NotFound { id: id.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Remote document store holding template records
///
/// Every call is at-most-once with last-writer-wins saves. Implementations
/// surface failures verbatim and never retry on the caller's behalf.
pub trait TemplateStore: Send + Sync {
    /// Insert or overwrite a record.
    ///
    /// Assigns an id when the record has none and stamps `updated_at`;
    /// returns the record exactly as stored.
    fn save(
        &self,
        record: TemplateRecord,
    ) -> impl Future<Output = Result<TemplateRecord, StoreError>> + Send;

    fn load(&self, id: &str) -> impl Future<Output = Result<TemplateRecord, StoreError>> + Send;

    /// Every record owned by `owner_id`, public or not, newest first
    fn list_owned_by(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<Vec<TemplateRecord>, StoreError>> + Send;

    /// Public records only, newest first, at most `limit`
    fn list_public(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<TemplateRecord>, StoreError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Prepare a record for writing: assign an id if needed and stamp `updated_at`
pub(crate) fn stamp_for_save(mut record: TemplateRecord) -> TemplateRecord {
    if record.id.is_empty() {
        record.id = uuid::Uuid::new_v4().to_string();
    }
    record.updated_at = store_timestamp();
    record
}

/// Listing order shared by every adapter: `created_at` descending, then id descending
pub(crate) fn sort_newest_first(records: &mut [TemplateRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}


#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;

    #[test]
    fn test_stamp_assigns_id_once() {
        let stamped = stamp_for_save(record("alice", "a", false, 5));
        assert!(!stamped.id.is_empty());
        assert!(stamped.updated_at > stamped.created_at);

        let id = stamped.id.clone();
        let restamped = stamp_for_save(stamped);
        assert_eq!(restamped.id, id);
    }

    #[test]
    fn test_sort_newest_first_breaks_ties_by_id() {
        let mut older = record("alice", "older", true, 10);
        older.id = "z".to_string();
        let mut tie_a = record("alice", "a", true, 0);
        tie_a.id = "a".to_string();
        let mut tie_b = tie_a.clone();
        tie_b.id = "b".to_string();

        let mut records = vec![older, tie_a, tie_b];
        sort_newest_first(&mut records);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "z"]);
    }
}
