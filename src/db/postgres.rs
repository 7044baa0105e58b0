use sqlx::types::Json;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::models::TemplateRecord;
use crate::persistence::{stamp_for_save, StoreError, TemplateStore};

/// Postgres persistence for template records
///
/// The whole record is kept as a JSONB document; `owner_id`, `is_public` and
/// the timestamps are mirrored into columns for filtering and ordering.
#[derive(Clone)]
pub struct PostgresTemplateStore {
    pool: PgPool,
}

impl PostgresTemplateStore {
    /// Connect to Postgres and apply pending migrations
    ///
    /// # Arguments
    /// * `database_url` - Postgres connection URL
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {}", e)))?;

        tracing::info!("Connected to Postgres at {}", database_url);

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode_all(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<TemplateRecord>, StoreError> {
        rows.into_iter()
            .map(|row| {
                let document: Json<TemplateRecord> = row.try_get("document")?;
                Ok::<_, StoreError>(document.0)
            })
            .collect()
    }

    /// Delete every template owned by `owner_id` (testing only)
    #[cfg(test)]
    pub async fn clear_owner(&self, owner_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM strategy_templates WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl TemplateStore for PostgresTemplateStore {
    async fn save(&self, record: TemplateRecord) -> Result<TemplateRecord, StoreError> {
        let record = stamp_for_save(record);

        sqlx::query(
            r#"
            INSERT INTO strategy_templates (id, owner_id, is_public, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                owner_id = EXCLUDED.owner_id,
                is_public = EXCLUDED.is_public,
                document = EXCLUDED.document,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.owner_id)
        .bind(record.is_public)
        .bind(Json(&record))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("Saved template {} ({}) to Postgres", record.id, record.name);

        Ok(record)
    }

    async fn load(&self, id: &str) -> Result<TemplateRecord, StoreError> {
        let row = sqlx::query("SELECT document FROM strategy_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let document: Json<TemplateRecord> = row.try_get("document")?;
                Ok(document.0)
            }
            None => Err(StoreError::not_found(id)),
        }
    }

    async fn list_owned_by(&self, owner_id: &str) -> Result<Vec<TemplateRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM strategy_templates
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Self::decode_all(rows)
    }

    async fn list_public(&self, limit: usize) -> Result<Vec<TemplateRecord>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT document
            FROM strategy_templates
            WHERE is_public
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Self::decode_all(rows)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM strategy_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(id));
        }

        tracing::info!("Deleted template {} from Postgres", id);

        Ok(())
    }
}
