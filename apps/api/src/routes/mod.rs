pub mod blocks;
pub mod configs;
pub mod generate;
pub mod health;
pub mod matching;

use axum::http::HeaderMap;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// Owner used when no X-User-Id header is supplied (local development).
const DEV_OWNER_ID: Uuid = Uuid::from_u128(1);

/// Extracts the owner id from the X-User-Id header. Auth proper lives
/// upstream; this service only needs the identity.
pub fn owner_id(headers: &HeaderMap) -> Result<Uuid, AppError> {
    match headers.get("x-user-id") {
        None => Ok(DEV_OWNER_ID),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| AppError::Validation("Invalid X-User-Id header".to_string())),
    }
}

/// BYOK AI key, when the caller supplied one.
pub fn ai_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-gemini-api-key")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Block store
        .route("/api/v1/blocks", get(blocks::handle_list_all))
        .route("/api/v1/blocks", post(blocks::handle_create))
        .route("/api/v1/blocks/bulk", post(blocks::handle_bulk_create))
        .route("/api/v1/blocks/:category", get(blocks::handle_list_by_category))
        .route(
            "/api/v1/blocks/:category/:identifier/:variant",
            get(blocks::handle_get_current),
        )
        .route(
            "/api/v1/blocks/:category/:identifier/:variant",
            put(blocks::handle_update),
        )
        .route(
            "/api/v1/blocks/:category/:identifier/:variant/versions",
            get(blocks::handle_list_versions),
        )
        .route(
            "/api/v1/blocks/:category/:identifier/:variant/:version",
            get(blocks::handle_get_version),
        )
        .route(
            "/api/v1/blocks/:category/:identifier/:variant/:version",
            delete(blocks::handle_delete_version),
        )
        // Chain policy overlays
        .route("/api/v1/block-configs", get(configs::handle_list))
        .route(
            "/api/v1/block-configs/:category/:identifier",
            get(configs::handle_get),
        )
        .route(
            "/api/v1/block-configs/:category/:identifier",
            put(configs::handle_upsert),
        )
        .route(
            "/api/v1/block-configs/:category/:identifier",
            delete(configs::handle_delete),
        )
        // Composition and matching
        .route("/api/v1/generate", post(generate::handle_generate))
        .route("/api/v1/match", post(matching::handle_match))
        .with_state(state)
}
