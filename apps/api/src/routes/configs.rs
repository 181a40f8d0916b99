//! Block config handlers: the priority/pinned-variant policy overlay
//! per chain. Configs are plain rows, not versioned.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::config::{BlockConfig, Priority};
use crate::routes::owner_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpsertConfigRequest {
    pub priority: String,
    #[serde(default)]
    pub pinned_variant: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub category: String,
    pub identifier: String,
    pub priority: String,
    pub pinned_variant: Option<String>,
}

impl From<BlockConfig> for ConfigResponse {
    fn from(config: BlockConfig) -> Self {
        ConfigResponse {
            category: config.category,
            identifier: config.identifier,
            priority: config.priority,
            pinned_variant: config.pinned_variant,
        }
    }
}

/// GET /api/v1/block-configs
pub async fn handle_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ConfigResponse>>, AppError> {
    let owner = owner_id(&headers)?;
    let configs: Vec<BlockConfig> =
        sqlx::query_as("SELECT * FROM block_configs WHERE owner_id = $1")
            .bind(owner)
            .fetch_all(&state.db)
            .await?;
    Ok(Json(configs.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/block-configs/:category/:identifier
///
/// Absence of a config implies `normal`, so a synthesized default is
/// returned rather than a 404.
pub async fn handle_get(
    State(state): State<AppState>,
    Path((category, identifier)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<ConfigResponse>, AppError> {
    let owner = owner_id(&headers)?;
    let config: Option<BlockConfig> = sqlx::query_as(
        "SELECT * FROM block_configs WHERE owner_id = $1 AND category = $2 AND identifier = $3",
    )
    .bind(owner)
    .bind(&category)
    .bind(&identifier)
    .fetch_optional(&state.db)
    .await?;

    Ok(Json(config.map(Into::into).unwrap_or(ConfigResponse {
        category,
        identifier,
        priority: Priority::Normal.as_str().to_string(),
        pinned_variant: None,
    })))
}

/// PUT /api/v1/block-configs/:category/:identifier
pub async fn handle_upsert(
    State(state): State<AppState>,
    Path((category, identifier)): Path<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<UpsertConfigRequest>,
) -> Result<Json<ConfigResponse>, AppError> {
    let owner = owner_id(&headers)?;
    let priority: Priority = req.priority.parse().map_err(AppError::ConfigInvalid)?;

    // priority=always is meaningless without a variant to pin.
    let pinned_variant = req.pinned_variant.filter(|v| !v.is_empty());
    if priority == Priority::Always && pinned_variant.is_none() {
        return Err(AppError::ConfigInvalid(
            "pinned_variant required when priority is 'always'".to_string(),
        ));
    }

    let config: BlockConfig = sqlx::query_as(
        r#"
        INSERT INTO block_configs (id, owner_id, category, identifier, priority, pinned_variant)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (owner_id, category, identifier)
        DO UPDATE SET priority = $5, pinned_variant = $6, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner)
    .bind(&category)
    .bind(&identifier)
    .bind(priority.as_str())
    .bind(&pinned_variant)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(config.into()))
}

/// DELETE /api/v1/block-configs/:category/:identifier — resets the
/// chain to the default `normal` priority.
pub async fn handle_delete(
    State(state): State<AppState>,
    Path((category, identifier)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let owner = owner_id(&headers)?;
    sqlx::query(
        "DELETE FROM block_configs WHERE owner_id = $1 AND category = $2 AND identifier = $3",
    )
    .bind(owner)
    .bind(&category)
    .bind(&identifier)
    .execute(&state.db)
    .await?;
    Ok(Json(json!({ "status": "deleted" })))
}
