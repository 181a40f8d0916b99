//! Composition resolver.
//!
//! Turns a composition request into a `ComposedDocument` by looking up
//! each block reference in the store. Resolution is best-effort: a
//! reference that points at nothing is dropped silently, because block
//! availability is user-controlled and a partial resume is still a
//! valid resume.

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::models::block::{Category, ExperiencePayload, HeadingPayload, ProjectPayload};
use crate::models::compose::{ComposedDocument, CompositionRequest};
use crate::store::{BlockStore, StoreError};

/// Variant used for single-segment references.
pub const DEFAULT_VARIANT: &str = "default";

/// A parsed block reference: `identifier[:variant[:version]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRef {
    pub identifier: String,
    pub variant: Option<String>,
    pub version: Option<String>,
}

impl BlockRef {
    /// Parses a 1-3 segment reference. Empty segments and anything with
    /// more than three segments are malformed and yield `None`.
    pub fn parse(reference: &str) -> Option<BlockRef> {
        let segments: Vec<&str> = reference.split(':').collect();
        if segments.is_empty() || segments.len() > 3 || segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(BlockRef {
            identifier: segments[0].to_string(),
            variant: segments.get(1).map(|s| s.to_string()),
            version: segments.get(2).map(|s| s.to_string()),
        })
    }
}

/// Resolves one reference to its block payload, or `None` when the
/// reference is malformed or points at nothing.
async fn resolve_ref(
    store: &dyn BlockStore,
    owner_id: Uuid,
    category: Category,
    reference: &str,
) -> Result<Option<Value>, StoreError> {
    let Some(parsed) = BlockRef::parse(reference) else {
        debug!("Dropping malformed reference '{reference}'");
        return Ok(None);
    };

    let block = match (&parsed.variant, &parsed.version) {
        (Some(variant), Some(version)) => {
            store
                .get_version(owner_id, category, &parsed.identifier, variant, version)
                .await?
        }
        (Some(variant), None) => {
            store
                .get_current(owner_id, category, &parsed.identifier, variant)
                .await?
        }
        (None, _) => {
            store
                .get_current(owner_id, category, &parsed.identifier, DEFAULT_VARIANT)
                .await?
        }
    };

    if block.is_none() {
        debug!("Reference '{reference}' ({category}) resolved to nothing, dropping");
    }
    Ok(block.map(|b| b.payload))
}

/// The text carried by a location/email block: the category-named key,
/// falling back to a generic `value` key.
fn override_text(category: Category, payload: &Value) -> Option<String> {
    payload
        .get(category.as_str())
        .or_else(|| payload.get("value"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Resolves a full composition request. Store read errors propagate;
/// missing content never does.
pub async fn resolve(
    store: &dyn BlockStore,
    owner_id: Uuid,
    request: &CompositionRequest,
) -> Result<ComposedDocument, StoreError> {
    let mut doc = ComposedDocument::default();

    for reference in &request.experiences {
        if let Some(payload) = resolve_ref(store, owner_id, Category::Experience, reference).await?
        {
            if let Ok(exp) = serde_json::from_value::<ExperiencePayload>(payload) {
                doc.experiences.push(exp);
            }
        }
    }

    for reference in &request.projects {
        if let Some(payload) = resolve_ref(store, owner_id, Category::Project, reference).await? {
            if let Ok(proj) = serde_json::from_value::<ProjectPayload>(payload) {
                doc.projects.push(proj);
            }
        }
    }

    if let Some(reference) = &request.skills {
        doc.skills = resolve_ref(store, owner_id, Category::Skills, reference).await?;
    }

    if let Some(reference) = &request.heading {
        doc.heading = resolve_ref(store, owner_id, Category::Heading, reference)
            .await?
            .and_then(|payload| serde_json::from_value::<HeadingPayload>(payload).ok());
    }

    if let Some(reference) = &request.education {
        doc.education = resolve_ref(store, owner_id, Category::Education, reference).await?;
    }

    if let Some(reference) = &request.location {
        doc.location = resolve_ref(store, owner_id, Category::Location, reference)
            .await?
            .and_then(|payload| override_text(Category::Location, &payload));
    }

    if let Some(reference) = &request.email {
        doc.email = resolve_ref(store, owner_id, Category::Email, reference)
            .await?
            .and_then(|payload| override_text(Category::Email, &payload));
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemBlockStore;
    use serde_json::json;

    #[test]
    fn test_block_ref_parsing() {
        assert_eq!(
            BlockRef::parse("amazon"),
            Some(BlockRef {
                identifier: "amazon".to_string(),
                variant: None,
                version: None,
            })
        );
        assert_eq!(
            BlockRef::parse("amazon:systems:1.0"),
            Some(BlockRef {
                identifier: "amazon".to_string(),
                variant: Some("systems".to_string()),
                version: Some("1.0".to_string()),
            })
        );
        assert_eq!(BlockRef::parse("a:b:c:d"), None);
        assert_eq!(BlockRef::parse(""), None);
        assert_eq!(BlockRef::parse("amazon::1.0"), None);
    }

    async fn seeded_store(owner: Uuid) -> MemBlockStore {
        let store = MemBlockStore::new();
        store
            .put(
                owner,
                Category::Experience,
                "amazon",
                "systems",
                json!({"title": "SDE", "company": "Amazon", "bullets": ["Did things"]}),
            )
            .await
            .unwrap();
        store
            .update(
                owner,
                Category::Experience,
                "amazon",
                "systems",
                json!({"title": "SDE II", "company": "Amazon", "bullets": ["Did more"]}),
            )
            .await
            .unwrap();
        store
            .put(
                owner,
                Category::Skills,
                "systems_hft",
                "default",
                json!({"Languages": ["C++", "Rust"]}),
            )
            .await
            .unwrap();
        store
            .put(
                owner,
                Category::Location,
                "default",
                "default",
                json!({"location": "Austin, TX"}),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_two_segment_ref_resolves_current_version() {
        let owner = Uuid::new_v4();
        let store = seeded_store(owner).await;
        let request = CompositionRequest {
            experiences: vec!["amazon:systems".to_string()],
            ..Default::default()
        };
        let doc = resolve(&store, owner, &request).await.unwrap();
        assert_eq!(doc.experiences.len(), 1);
        assert_eq!(doc.experiences[0].title.as_deref(), Some("SDE II"));
    }

    #[tokio::test]
    async fn test_three_segment_ref_pins_exact_version() {
        let owner = Uuid::new_v4();
        let store = seeded_store(owner).await;
        let request = CompositionRequest {
            experiences: vec!["amazon:systems:1.0".to_string()],
            ..Default::default()
        };
        let doc = resolve(&store, owner, &request).await.unwrap();
        assert_eq!(doc.experiences[0].title.as_deref(), Some("SDE"));
    }

    #[tokio::test]
    async fn test_one_segment_ref_uses_default_variant() {
        let owner = Uuid::new_v4();
        let store = seeded_store(owner).await;
        let request = CompositionRequest {
            skills: Some("systems_hft".to_string()),
            ..Default::default()
        };
        let doc = resolve(&store, owner, &request).await.unwrap();
        assert!(doc.skills.is_some());
    }

    #[tokio::test]
    async fn test_unresolved_references_are_dropped_silently() {
        let owner = Uuid::new_v4();
        let store = seeded_store(owner).await;
        let request = CompositionRequest {
            experiences: vec![
                "amazon:systems".to_string(),
                "ghost:nowhere".to_string(),
                "amazon:systems:9.9".to_string(),
                "a:b:c:d".to_string(),
            ],
            skills: Some("missing".to_string()),
            ..Default::default()
        };
        let doc = resolve(&store, owner, &request).await.unwrap();
        assert_eq!(doc.experiences.len(), 1);
        assert!(doc.skills.is_none());
    }

    #[tokio::test]
    async fn test_empty_request_yields_empty_document() {
        let owner = Uuid::new_v4();
        let store = seeded_store(owner).await;
        let doc = resolve(&store, owner, &CompositionRequest::default())
            .await
            .unwrap();
        assert!(doc.is_empty());
    }

    #[tokio::test]
    async fn test_location_block_resolves_to_override_text() {
        let owner = Uuid::new_v4();
        let store = seeded_store(owner).await;
        let request = CompositionRequest {
            location: Some("default".to_string()),
            ..Default::default()
        };
        let doc = resolve(&store, owner, &request).await.unwrap();
        assert_eq!(doc.location.as_deref(), Some("Austin, TX"));
    }
}
