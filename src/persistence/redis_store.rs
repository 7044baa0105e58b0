use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::time::{timeout, Duration};

use super::{sort_newest_first, stamp_for_save, StoreError, TemplateStore};
use crate::models::TemplateRecord;

const PUBLIC_INDEX: &str = "templates:public";

fn record_key(id: &str) -> String {
    format!("template:{}", id)
}

fn owner_index(owner_id: &str) -> String {
    format!("templates:owner:{}", owner_id)
}

/// Redis-backed template store
///
/// Records are JSON strings under `template:{id}`. Listing uses sorted sets
/// (`templates:public`, `templates:owner:{owner}`) with `created_at` in
/// microseconds as the score, the same precision the listings sort on.
#[derive(Clone)]
pub struct RedisTemplateStore {
    conn: ConnectionManager,
}

impl RedisTemplateStore {
    /// Connect to Redis
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub async fn new(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;

        // Give up after 5 seconds rather than hanging the session
        let conn = timeout(Duration::from_secs(5), ConnectionManager::new(client))
            .await
            .map_err(|_| {
                StoreError::Unavailable("Redis connection timeout after 5 seconds".to_string())
            })??;

        tracing::info!("Connected to Redis at {}", redis_url);

        Ok(Self { conn })
    }

    /// Fetch records for ids in index order, skipping ids whose document is gone
    async fn fetch_all(&self, ids: &[String]) -> Result<Vec<TemplateRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| record_key(id)).collect();
        let mut conn = self.conn.clone();
        let documents: Vec<Option<String>> = conn.mget(&keys).await?;

        let mut records = Vec::with_capacity(documents.len());
        for (id, document) in ids.iter().zip(documents) {
            match document {
                Some(json) => records.push(serde_json::from_str::<TemplateRecord>(&json)?),
                None => tracing::warn!("Template {} is indexed but has no document", id),
            }
        }
        Ok(records)
    }
}

/// Sorted-set score of a record
fn score(record: &TemplateRecord) -> f64 {
    record.created_at.timestamp_micros() as f64
}

impl TemplateStore for RedisTemplateStore {
    async fn save(&self, record: TemplateRecord) -> Result<TemplateRecord, StoreError> {
        let record = stamp_for_save(record);
        let key = record_key(&record.id);
        let json = serde_json::to_string(&record)?;
        let score = score(&record);

        let mut conn = self.conn.clone();
        let previous: Option<String> = conn.get(&key).await?;
        let previous_owner = match previous {
            Some(json) => Some(serde_json::from_str::<TemplateRecord>(&json)?.owner_id),
            None => None,
        };

        let mut pipe = redis::pipe();
        pipe.atomic();
        if let Some(owner) = previous_owner.filter(|owner| *owner != record.owner_id) {
            pipe.zrem(owner_index(&owner), &record.id).ignore();
        }
        pipe.set(&key, json).ignore();
        pipe.zadd(owner_index(&record.owner_id), &record.id, score)
            .ignore();
        if record.is_public {
            pipe.zadd(PUBLIC_INDEX, &record.id, score).ignore();
        } else {
            pipe.zrem(PUBLIC_INDEX, &record.id).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;

        tracing::info!("Saved template {} ({}) to Redis", record.id, record.name);

        Ok(record)
    }

    async fn load(&self, id: &str) -> Result<TemplateRecord, StoreError> {
        let mut conn = self.conn.clone();
        let document: Option<String> = conn.get(record_key(id)).await?;
        match document {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Err(StoreError::not_found(id)),
        }
    }

    async fn list_owned_by(&self, owner_id: &str) -> Result<Vec<TemplateRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.zrevrange(owner_index(owner_id), 0, -1).await?;

        let mut records = self.fetch_all(&ids).await?;
        // The index is authoritative only until the next save; trust the document
        records.retain(|r| r.owner_id == owner_id);
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn list_public(&self, limit: usize) -> Result<Vec<TemplateRecord>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let stop = isize::try_from(limit - 1).unwrap_or(isize::MAX);
        let ids: Vec<String> = conn.zrevrange(PUBLIC_INDEX, 0, stop).await?;

        let mut records = self.fetch_all(&ids).await?;
        records.retain(|r| r.is_public);
        sort_newest_first(&mut records);

        tracing::debug!("Listed {} public templates from Redis", records.len());

        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let record = self.load(id).await?;

        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .del(record_key(id))
            .ignore()
            .zrem(PUBLIC_INDEX, id)
            .ignore()
            .zrem(owner_index(&record.owner_id), id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        tracing::info!("Deleted template {} from Redis", id);

        Ok(())
    }
}
