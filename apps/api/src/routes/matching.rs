//! Job-description matching: gather the owner's tagged chains, let the
//! AI propose a selection, then enforce pinning and minimum-count
//! policy. Unlike tag enrichment, this endpoint *requires* the AI
//! result, so AI failures propagate to the client.

use std::collections::{HashMap, HashSet};

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::ai::matching::{
    ensure_minimum_selections, AvailableSections, MatchResult, PinnedSection, TaggedChain,
    VariantTags,
};
use crate::errors::AppError;
use crate::models::block::{Category, ContentBlock};
use crate::models::config::{BlockConfig, Priority};
use crate::routes::{ai_key, owner_id};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub job_description: String,
}

fn block_tags(block: &ContentBlock) -> Vec<String> {
    block
        .payload
        .get("tags")
        .and_then(|v| v.as_array())
        .map(|tags| {
            tags.iter()
                .filter_map(|t| t.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Groups current blocks into chains with per-variant tags, dropping
/// identifiers excluded by a `never` config.
fn group_chains(blocks: Vec<ContentBlock>, excluded: &HashSet<String>) -> Vec<TaggedChain> {
    let mut grouped: HashMap<String, Vec<VariantTags>> = HashMap::new();
    for block in blocks.into_iter().filter(|b| b.is_current) {
        if excluded.contains(&block.identifier) {
            continue;
        }
        let tags = block_tags(&block);
        grouped.entry(block.identifier).or_default().push(VariantTags {
            variant: block.variant,
            tags,
        });
    }
    let mut chains: Vec<TaggedChain> = grouped
        .into_iter()
        .map(|(identifier, variants)| TaggedChain {
            identifier,
            variants,
        })
        .collect();
    chains.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    chains
}

async fn load_policies(
    state: &AppState,
    owner: Uuid,
) -> Result<(HashMap<Category, HashSet<String>>, Vec<PinnedSection>), AppError> {
    let configs: Vec<BlockConfig> =
        sqlx::query_as("SELECT * FROM block_configs WHERE owner_id = $1")
            .bind(owner)
            .fetch_all(&state.db)
            .await?;

    let mut excluded: HashMap<Category, HashSet<String>> = HashMap::new();
    let mut pinned = Vec::new();
    for config in configs {
        let Ok(category) = config.category.parse::<Category>() else {
            continue;
        };
        match config.priority.parse::<Priority>() {
            Ok(Priority::Never) => {
                excluded.entry(category).or_default().insert(config.identifier);
            }
            Ok(Priority::Always) => {
                if let Some(variant) = config.pinned_variant {
                    pinned.push(PinnedSection {
                        category,
                        identifier: config.identifier,
                        variant,
                    });
                }
            }
            _ => {}
        }
    }
    Ok((excluded, pinned))
}

/// POST /api/v1/match
pub async fn handle_match(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchResult>, AppError> {
    let owner = owner_id(&headers)?;
    let key = ai_key(&headers).ok_or_else(|| {
        AppError::Validation("X-Gemini-API-Key header is required for matching".to_string())
    })?;

    let terms = state.ai.extract_terms(&key, &req.job_description).await?;

    let (excluded, pinned) = load_policies(&state, owner).await?;
    let empty = HashSet::new();

    let experiences = group_chains(
        state.store.list_by_category(owner, Category::Experience).await?,
        excluded.get(&Category::Experience).unwrap_or(&empty),
    );
    let projects = group_chains(
        state.store.list_by_category(owner, Category::Project).await?,
        excluded.get(&Category::Project).unwrap_or(&empty),
    );
    let skills: Vec<VariantTags> = state
        .store
        .list_by_category(owner, Category::Skills)
        .await?
        .into_iter()
        .filter(|b| b.is_current)
        .map(|b| {
            let tags = block_tags(&b);
            VariantTags {
                variant: b.variant,
                tags,
            }
        })
        .collect();

    let available = AvailableSections {
        experiences,
        projects,
        skills,
    };

    let mut result = state
        .ai
        .match_sections(&key, &terms, &available, &pinned)
        .await?;
    ensure_minimum_selections(
        &mut result,
        &available,
        &pinned,
        state.config.min_match_selections,
    );

    Ok(Json(result))
}
