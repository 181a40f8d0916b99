//! PostgreSQL-backed block store.
//!
//! Chain mutations run inside a transaction with `SELECT ... FOR UPDATE`
//! on the chain's current row, so concurrent updates to the same chain
//! serialize while different chains stay independent.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::block::{Category, ContentBlock};
use crate::store::{next_version, BlockStore, StoreError};

#[derive(Clone)]
pub struct PgBlockStore {
    pool: PgPool,
}

impl PgBlockStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn chain_label(category: Category, identifier: &str, variant: &str) -> String {
    format!("{category}/{identifier}/{variant}")
}

#[async_trait]
impl BlockStore for PgBlockStore {
    async fn put(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
        payload: Value,
    ) -> Result<ContentBlock, StoreError> {
        if self
            .get_current(owner_id, category, identifier, variant)
            .await?
            .is_some()
        {
            return Err(StoreError::AlreadyExists(chain_label(
                category, identifier, variant,
            )));
        }

        let block: ContentBlock = sqlx::query_as(
            r#"
            INSERT INTO content_blocks
                (id, owner_id, category, identifier, variant, version, payload, is_current)
            VALUES ($1, $2, $3, $4, $5, '1.0', $6, TRUE)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(category.as_str())
        .bind(identifier)
        .bind(variant)
        .bind(&payload)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Created block {} version 1.0 for owner {owner_id}",
            chain_label(category, identifier, variant)
        );
        Ok(block)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
        payload: Value,
    ) -> Result<ContentBlock, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock the current row so concurrent updates to this chain serialize.
        let current: Option<ContentBlock> = sqlx::query_as(
            r#"
            SELECT * FROM content_blocks
            WHERE owner_id = $1 AND category = $2 AND identifier = $3
              AND variant = $4 AND is_current = TRUE
            FOR UPDATE
            "#,
        )
        .bind(owner_id)
        .bind(category.as_str())
        .bind(identifier)
        .bind(variant)
        .fetch_optional(&mut *tx)
        .await?;

        let current = current.ok_or_else(|| {
            StoreError::NotFound(chain_label(category, identifier, variant))
        })?;
        let new_version = next_version(&current.version)?;

        sqlx::query("UPDATE content_blocks SET is_current = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(current.id)
            .execute(&mut *tx)
            .await?;

        let block: ContentBlock = sqlx::query_as(
            r#"
            INSERT INTO content_blocks
                (id, owner_id, category, identifier, variant, version, payload, is_current)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(category.as_str())
        .bind(identifier)
        .bind(variant)
        .bind(&new_version)
        .bind(&payload)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Updated block {} to version {new_version} for owner {owner_id}",
            chain_label(category, identifier, variant)
        );
        Ok(block)
    }

    async fn get_current(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
    ) -> Result<Option<ContentBlock>, StoreError> {
        Ok(sqlx::query_as(
            r#"
            SELECT * FROM content_blocks
            WHERE owner_id = $1 AND category = $2 AND identifier = $3
              AND variant = $4 AND is_current = TRUE
            "#,
        )
        .bind(owner_id)
        .bind(category.as_str())
        .bind(identifier)
        .bind(variant)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn get_version(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
        version: &str,
    ) -> Result<Option<ContentBlock>, StoreError> {
        Ok(sqlx::query_as(
            r#"
            SELECT * FROM content_blocks
            WHERE owner_id = $1 AND category = $2 AND identifier = $3
              AND variant = $4 AND version = $5
            "#,
        )
        .bind(owner_id)
        .bind(category.as_str())
        .bind(identifier)
        .bind(variant)
        .bind(version)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_versions(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
    ) -> Result<Vec<ContentBlock>, StoreError> {
        Ok(sqlx::query_as(
            r#"
            SELECT * FROM content_blocks
            WHERE owner_id = $1 AND category = $2 AND identifier = $3 AND variant = $4
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(category.as_str())
        .bind(identifier)
        .bind(variant)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_by_category(
        &self,
        owner_id: Uuid,
        category: Category,
    ) -> Result<Vec<ContentBlock>, StoreError> {
        Ok(sqlx::query_as(
            "SELECT * FROM content_blocks WHERE owner_id = $1 AND category = $2 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_all(&self, owner_id: Uuid) -> Result<Vec<ContentBlock>, StoreError> {
        Ok(sqlx::query_as(
            "SELECT * FROM content_blocks WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_version(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
        version: &str,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let deleted: Option<ContentBlock> = sqlx::query_as(
            r#"
            DELETE FROM content_blocks
            WHERE owner_id = $1 AND category = $2 AND identifier = $3
              AND variant = $4 AND version = $5
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(category.as_str())
        .bind(identifier)
        .bind(variant)
        .bind(version)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(deleted) = deleted else {
            tx.rollback().await?;
            return Ok(false);
        };

        // Deleting the current version promotes the most recently
        // created remaining block, if any remain.
        if deleted.is_current {
            sqlx::query(
                r#"
                UPDATE content_blocks SET is_current = TRUE, updated_at = NOW()
                WHERE id = (
                    SELECT id FROM content_blocks
                    WHERE owner_id = $1 AND category = $2 AND identifier = $3 AND variant = $4
                    ORDER BY created_at DESC
                    LIMIT 1
                )
                "#,
            )
            .bind(owner_id)
            .bind(category.as_str())
            .bind(identifier)
            .bind(variant)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            "Deleted block {} version {version} for owner {owner_id}",
            chain_label(category, identifier, variant)
        );
        Ok(true)
    }
}
