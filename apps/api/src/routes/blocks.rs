//! Block store handlers: versioned CRUD plus optional AI tag
//! enrichment on create/update.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::models::block::{Category, ContentBlock};
use crate::routes::{ai_key, owner_id};
use crate::state::AppState;

fn parse_category(raw: &str) -> Result<Category, AppError> {
    raw.parse().map_err(AppError::Validation)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlockRequest {
    pub category: String,
    pub identifier: String,
    pub variant: String,
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBlockRequest {
    pub payload: Value,
}

/// Tag enrichment is optional: no key means no tags, and an AI failure
/// degrades to an empty tag list rather than failing the write.
async fn enrich_tags(
    state: &AppState,
    headers: &HeaderMap,
    mut payload: Value,
    category: Category,
) -> Value {
    let Some(key) = ai_key(headers) else {
        return payload;
    };
    let tags = match state.ai.extract_tags(&key, &payload, category).await {
        Ok(tags) => tags,
        Err(err) => {
            warn!("Tag generation failed, continuing without tags: {err}");
            Vec::new()
        }
    };
    if let Value::Object(map) = &mut payload {
        map.insert("tags".to_string(), json!(tags));
    }
    payload
}

/// POST /api/v1/blocks
pub async fn handle_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateBlockRequest>,
) -> Result<(StatusCode, Json<ContentBlock>), AppError> {
    let owner = owner_id(&headers)?;
    let category = parse_category(&req.category)?;
    let payload = enrich_tags(&state, &headers, req.payload, category).await;
    let block = state
        .store
        .put(owner, category, &req.identifier, &req.variant, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(block)))
}

#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    pub blocks: Vec<CreateBlockRequest>,
}

#[derive(Debug, Serialize)]
pub struct BulkItemOutcome {
    pub identifier: String,
    pub variant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<ContentBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/v1/blocks/bulk
///
/// Each item succeeds or fails on its own; one failure never aborts
/// its siblings.
pub async fn handle_bulk_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BulkCreateRequest>,
) -> Result<Json<Vec<BulkItemOutcome>>, AppError> {
    let owner = owner_id(&headers)?;
    let mut outcomes = Vec::with_capacity(req.blocks.len());

    for item in req.blocks {
        let outcome = match parse_category(&item.category) {
            Err(err) => BulkItemOutcome {
                identifier: item.identifier,
                variant: item.variant,
                block: None,
                error: Some(err.to_string()),
            },
            Ok(category) => {
                let payload = enrich_tags(&state, &headers, item.payload, category).await;
                match state
                    .store
                    .put(owner, category, &item.identifier, &item.variant, payload)
                    .await
                {
                    Ok(block) => BulkItemOutcome {
                        identifier: item.identifier,
                        variant: item.variant,
                        block: Some(block),
                        error: None,
                    },
                    Err(err) => BulkItemOutcome {
                        identifier: item.identifier,
                        variant: item.variant,
                        block: None,
                        error: Some(err.to_string()),
                    },
                }
            }
        };
        outcomes.push(outcome);
    }

    Ok(Json(outcomes))
}

/// PUT /api/v1/blocks/:category/:identifier/:variant
pub async fn handle_update(
    State(state): State<AppState>,
    Path((category, identifier, variant)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(req): Json<UpdateBlockRequest>,
) -> Result<Json<ContentBlock>, AppError> {
    let owner = owner_id(&headers)?;
    let category = parse_category(&category)?;
    let payload = enrich_tags(&state, &headers, req.payload, category).await;
    let block = state
        .store
        .update(owner, category, &identifier, &variant, payload)
        .await?;
    Ok(Json(block))
}

/// GET /api/v1/blocks
pub async fn handle_list_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ContentBlock>>, AppError> {
    let owner = owner_id(&headers)?;
    Ok(Json(state.store.list_all(owner).await?))
}

/// GET /api/v1/blocks/:category
pub async fn handle_list_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<ContentBlock>>, AppError> {
    let owner = owner_id(&headers)?;
    let category = parse_category(&category)?;
    Ok(Json(state.store.list_by_category(owner, category).await?))
}

/// GET /api/v1/blocks/:category/:identifier/:variant
pub async fn handle_get_current(
    State(state): State<AppState>,
    Path((category, identifier, variant)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<ContentBlock>, AppError> {
    let owner = owner_id(&headers)?;
    let category = parse_category(&category)?;
    state
        .store
        .get_current(owner, category, &identifier, &variant)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!("{category}/{identifier}/{variant} has no current block"))
        })
}

/// GET /api/v1/blocks/:category/:identifier/:variant/versions
pub async fn handle_list_versions(
    State(state): State<AppState>,
    Path((category, identifier, variant)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<Vec<ContentBlock>>, AppError> {
    let owner = owner_id(&headers)?;
    let category = parse_category(&category)?;
    Ok(Json(
        state
            .store
            .list_versions(owner, category, &identifier, &variant)
            .await?,
    ))
}

/// GET /api/v1/blocks/:category/:identifier/:variant/:version
pub async fn handle_get_version(
    State(state): State<AppState>,
    Path((category, identifier, variant, version)): Path<(String, String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<ContentBlock>, AppError> {
    let owner = owner_id(&headers)?;
    let category = parse_category(&category)?;
    state
        .store
        .get_version(owner, category, &identifier, &variant, &version)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!("{category}/{identifier}/{variant} version {version}"))
        })
}

/// DELETE /api/v1/blocks/:category/:identifier/:variant/:version
pub async fn handle_delete_version(
    State(state): State<AppState>,
    Path((category, identifier, variant, version)): Path<(String, String, String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let owner = owner_id(&headers)?;
    let category = parse_category(&category)?;
    let deleted = state
        .store
        .delete_version(owner, category, &identifier, &variant, &version)
        .await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "{category}/{identifier}/{variant} version {version}"
        )))
    }
}
