//! Versioned content store.
//!
//! Blocks are append-only: each (owner, category, identifier, variant)
//! chain grows by inserting a new version and flipping the previous
//! current flag in the same transaction. Blocks are never mutated in
//! place.

pub mod mem;
pub mod pg;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::block::{Category, ContentBlock};

pub use mem::MemBlockStore;
pub use pg::PgBlockStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("block already exists: {0}")]
    AlreadyExists(String),

    #[error("block not found: {0}")]
    NotFound(String),

    #[error("malformed version label '{0}'")]
    InvalidVersion(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Computes the next version label in a chain: "1.0" -> "1.1",
/// "1.9" -> "1.10". The minor component increments indefinitely; there
/// is no major rollover — versions are per-chain edit counters, not
/// semantic versions.
pub fn next_version(version: &str) -> Result<String, StoreError> {
    let (major, minor) = version
        .split_once('.')
        .ok_or_else(|| StoreError::InvalidVersion(version.to_string()))?;
    let major: u64 = major
        .parse()
        .map_err(|_| StoreError::InvalidVersion(version.to_string()))?;
    let minor: u64 = minor
        .parse()
        .map_err(|_| StoreError::InvalidVersion(version.to_string()))?;
    Ok(format!("{major}.{}", minor + 1))
}

/// Storage backend for versioned content blocks. All operations are
/// scoped by owner; concurrent mutations of the same chain serialize
/// inside the implementation so two writers never both mark a version
/// current.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Creates version "1.0" of a new chain. Fails with `AlreadyExists`
    /// when the chain already has a current block.
    async fn put(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
        payload: Value,
    ) -> Result<ContentBlock, StoreError>;

    /// Appends a new version to an existing chain, atomically flipping
    /// the previous current block. Fails with `NotFound` when the chain
    /// has no current block.
    async fn update(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
        payload: Value,
    ) -> Result<ContentBlock, StoreError>;

    async fn get_current(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
    ) -> Result<Option<ContentBlock>, StoreError>;

    async fn get_version(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
        version: &str,
    ) -> Result<Option<ContentBlock>, StoreError>;

    /// All versions of one chain, newest first.
    async fn list_versions(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
    ) -> Result<Vec<ContentBlock>, StoreError>;

    async fn list_by_category(
        &self,
        owner_id: Uuid,
        category: Category,
    ) -> Result<Vec<ContentBlock>, StoreError>;

    async fn list_all(&self, owner_id: Uuid) -> Result<Vec<ContentBlock>, StoreError>;

    /// Removes one version. If it was current, the most recently created
    /// remaining block in the chain (if any) becomes current. Returns
    /// false when nothing matched.
    async fn delete_version(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
        version: &str,
    ) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_version_increments_minor() {
        assert_eq!(next_version("1.0").unwrap(), "1.1");
        assert_eq!(next_version("1.1").unwrap(), "1.2");
    }

    #[test]
    fn test_next_version_no_carry_into_major() {
        // edit counters, not semver: 1.9 -> 1.10
        assert_eq!(next_version("1.9").unwrap(), "1.10");
        assert_eq!(next_version("1.10").unwrap(), "1.11");
        assert_eq!(next_version("2.99").unwrap(), "2.100");
    }

    #[test]
    fn test_next_version_rejects_malformed_labels() {
        for bad in ["", "1", "1.", ".1", "a.b", "1.2.3", "1.x"] {
            assert!(
                matches!(next_version(bad), Err(StoreError::InvalidVersion(_))),
                "expected InvalidVersion for {bad:?}"
            );
        }
    }
}
