//! In-memory block store.
//!
//! An arena of immutable block records grouped per chain, with the
//! current pointer maintained under a single write-lock scope per
//! mutation. Backs the test suite and local development without
//! Postgres; semantics mirror `PgBlockStore` exactly.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::models::block::{Category, ContentBlock};
use crate::store::{next_version, BlockStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ChainKey {
    owner_id: Uuid,
    category: Category,
    identifier: String,
    variant: String,
}

impl ChainKey {
    fn new(owner_id: Uuid, category: Category, identifier: &str, variant: &str) -> Self {
        Self {
            owner_id,
            category,
            identifier: identifier.to_string(),
            variant: variant.to_string(),
        }
    }

    fn label(&self) -> String {
        format!("{}/{}/{}", self.category, self.identifier, self.variant)
    }
}

/// Blocks per chain in creation order; the last element is the most
/// recently created.
#[derive(Default)]
pub struct MemBlockStore {
    chains: RwLock<HashMap<ChainKey, Vec<ContentBlock>>>,
}

impl MemBlockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn make_block(key: &ChainKey, version: String, payload: Value) -> ContentBlock {
    let now = Utc::now();
    ContentBlock {
        id: Uuid::new_v4(),
        owner_id: key.owner_id,
        category: key.category.as_str().to_string(),
        identifier: key.identifier.clone(),
        variant: key.variant.clone(),
        version,
        payload,
        is_current: true,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl BlockStore for MemBlockStore {
    async fn put(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
        payload: Value,
    ) -> Result<ContentBlock, StoreError> {
        let key = ChainKey::new(owner_id, category, identifier, variant);
        let mut chains = self.chains.write().unwrap();
        let chain = chains.entry(key.clone()).or_default();
        if chain.iter().any(|b| b.is_current) {
            return Err(StoreError::AlreadyExists(key.label()));
        }
        let block = make_block(&key, "1.0".to_string(), payload);
        chain.push(block.clone());
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
        let key = ChainKey::new(owner_id, category, identifier, variant);
        let mut chains = self.chains.write().unwrap();
        let chain = chains
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(key.label()))?;
        let current = chain
            .iter_mut()
            .find(|b| b.is_current)
            .ok_or_else(|| StoreError::NotFound(key.label()))?;
        let new_version = next_version(&current.version)?;
        current.is_current = false;
        current.updated_at = Utc::now();
        let block = make_block(&key, new_version, payload);
        chain.push(block.clone());
        Ok(block)
    }

    async fn get_current(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
    ) -> Result<Option<ContentBlock>, StoreError> {
        let key = ChainKey::new(owner_id, category, identifier, variant);
        let chains = self.chains.read().unwrap();
        Ok(chains
            .get(&key)
            .and_then(|chain| chain.iter().find(|b| b.is_current).cloned()))
    }

    async fn get_version(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
        version: &str,
    ) -> Result<Option<ContentBlock>, StoreError> {
        let key = ChainKey::new(owner_id, category, identifier, variant);
        let chains = self.chains.read().unwrap();
        Ok(chains
            .get(&key)
            .and_then(|chain| chain.iter().find(|b| b.version == version).cloned()))
    }

    async fn list_versions(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
    ) -> Result<Vec<ContentBlock>, StoreError> {
        let key = ChainKey::new(owner_id, category, identifier, variant);
        let chains = self.chains.read().unwrap();
        Ok(chains
            .get(&key)
            .map(|chain| chain.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_by_category(
        &self,
        owner_id: Uuid,
        category: Category,
    ) -> Result<Vec<ContentBlock>, StoreError> {
        let chains = self.chains.read().unwrap();
        let mut blocks: Vec<ContentBlock> = chains
            .iter()
            .filter(|(key, _)| key.owner_id == owner_id && key.category == category)
            .flat_map(|(_, chain)| chain.iter().cloned())
            .collect();
        blocks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(blocks)
    }

    async fn list_all(&self, owner_id: Uuid) -> Result<Vec<ContentBlock>, StoreError> {
        let chains = self.chains.read().unwrap();
        let mut blocks: Vec<ContentBlock> = chains
            .iter()
            .filter(|(key, _)| key.owner_id == owner_id)
            .flat_map(|(_, chain)| chain.iter().cloned())
            .collect();
        blocks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(blocks)
    }

    async fn delete_version(
        &self,
        owner_id: Uuid,
        category: Category,
        identifier: &str,
        variant: &str,
        version: &str,
    ) -> Result<bool, StoreError> {
        let key = ChainKey::new(owner_id, category, identifier, variant);
        let mut chains = self.chains.write().unwrap();
        let Some(chain) = chains.get_mut(&key) else {
            return Ok(false);
        };
        let Some(pos) = chain.iter().position(|b| b.version == version) else {
            return Ok(false);
        };
        let deleted = chain.remove(pos);
        if deleted.is_current {
            // Promote the most recently created remaining block.
            if let Some(last) = chain.last_mut() {
                last.is_current = true;
                last.updated_at = Utc::now();
            }
        }
        if chain.is_empty() {
            chains.remove(&key);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn owner() -> Uuid {
        Uuid::new_v4()
    }

    #[tokio::test]
    async fn test_put_starts_chain_at_one_dot_zero() {
        let store = MemBlockStore::new();
        let block = store
            .put(owner(), Category::Experience, "amazon", "systems", json!({}))
            .await
            .unwrap();
        assert_eq!(block.version, "1.0");
        assert!(block.is_current);
    }

    #[tokio::test]
    async fn test_put_twice_fails_already_exists() {
        let store = MemBlockStore::new();
        let o = owner();
        store
            .put(o, Category::Experience, "amazon", "systems", json!({}))
            .await
            .unwrap();
        let err = store
            .put(o, Category::Experience, "amazon", "systems", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_update_without_chain_fails_not_found() {
        let store = MemBlockStore::new();
        let err = store
            .update(owner(), Category::Project, "ghost", "default", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_nine_updates_walk_minor_past_ten() {
        let store = MemBlockStore::new();
        let o = owner();
        store
            .put(o, Category::Experience, "amazon", "systems", json!({}))
            .await
            .unwrap();
        let mut last = String::new();
        for _ in 0..10 {
            last = store
                .update(o, Category::Experience, "amazon", "systems", json!({}))
                .await
                .unwrap()
                .version;
        }
        // 1.0 + 10 updates: ...1.9, then 1.10 — never 2.0
        assert_eq!(last, "1.10");

        let versions: Vec<String> = store
            .list_versions(o, Category::Experience, "amazon", "systems")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.version)
            .collect();
        assert_eq!(versions.first().map(String::as_str), Some("1.10"));
        assert_eq!(versions.last().map(String::as_str), Some("1.0"));
        assert_eq!(versions.len(), 11);
    }

    #[tokio::test]
    async fn test_at_most_one_current_after_updates() {
        let store = MemBlockStore::new();
        let o = owner();
        store
            .put(o, Category::Skills, "core", "default", json!({}))
            .await
            .unwrap();
        for _ in 0..5 {
            store
                .update(o, Category::Skills, "core", "default", json!({}))
                .await
                .unwrap();
        }
        let versions = store
            .list_versions(o, Category::Skills, "core", "default")
            .await
            .unwrap();
        assert_eq!(versions.iter().filter(|b| b.is_current).count(), 1);
        assert_eq!(versions[0].version, "1.5");
        assert!(versions[0].is_current);
    }

    #[tokio::test]
    async fn test_delete_current_promotes_latest_remaining() {
        let store = MemBlockStore::new();
        let o = owner();
        store
            .put(o, Category::Project, "kambaz", "fullstack", json!({}))
            .await
            .unwrap();
        store
            .update(o, Category::Project, "kambaz", "fullstack", json!({}))
            .await
            .unwrap();
        store
            .update(o, Category::Project, "kambaz", "fullstack", json!({}))
            .await
            .unwrap();

        let deleted = store
            .delete_version(o, Category::Project, "kambaz", "fullstack", "1.2")
            .await
            .unwrap();
        assert!(deleted);

        let current = store
            .get_current(o, Category::Project, "kambaz", "fullstack")
            .await
            .unwrap()
            .expect("a remaining block must be promoted");
        assert_eq!(current.version, "1.1");

        let versions = store
            .list_versions(o, Category::Project, "kambaz", "fullstack")
            .await
            .unwrap();
        assert_eq!(versions.iter().filter(|b| b.is_current).count(), 1);
    }

    #[tokio::test]
    async fn test_delete_sole_version_leaves_empty_chain() {
        let store = MemBlockStore::new();
        let o = owner();
        store
            .put(o, Category::Heading, "default", "default", json!({}))
            .await
            .unwrap();
        assert!(store
            .delete_version(o, Category::Heading, "default", "default", "1.0")
            .await
            .unwrap());
        assert!(store
            .get_current(o, Category::Heading, "default", "default")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .list_versions(o, Category::Heading, "default", "default")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_non_current_keeps_current_pointer() {
        let store = MemBlockStore::new();
        let o = owner();
        store
            .put(o, Category::Experience, "isro", "systems", json!({}))
            .await
            .unwrap();
        store
            .update(o, Category::Experience, "isro", "systems", json!({}))
            .await
            .unwrap();

        assert!(store
            .delete_version(o, Category::Experience, "isro", "systems", "1.0")
            .await
            .unwrap());
        let current = store
            .get_current(o, Category::Experience, "isro", "systems")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.version, "1.1");
    }

    #[tokio::test]
    async fn test_delete_missing_version_returns_false() {
        let store = MemBlockStore::new();
        assert!(!store
            .delete_version(owner(), Category::Experience, "nope", "nope", "1.0")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_put_after_full_delete_restarts_chain() {
        let store = MemBlockStore::new();
        let o = owner();
        store
            .put(o, Category::Skills, "core", "default", json!({"a": 1}))
            .await
            .unwrap();
        store
            .delete_version(o, Category::Skills, "core", "default", "1.0")
            .await
            .unwrap();
        let block = store
            .put(o, Category::Skills, "core", "default", json!({"a": 2}))
            .await
            .unwrap();
        assert_eq!(block.version, "1.0");
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let store = MemBlockStore::new();
        let (a, b) = (owner(), owner());
        store
            .put(a, Category::Experience, "amazon", "systems", json!({}))
            .await
            .unwrap();
        assert!(store
            .get_current(b, Category::Experience, "amazon", "systems")
            .await
            .unwrap()
            .is_none());
        assert!(store.list_all(b).await.unwrap().is_empty());
    }
}
