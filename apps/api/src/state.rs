use std::sync::Arc;

use sqlx::PgPool;

use crate::ai::AiService;
use crate::config::Config;
use crate::render::RenderSettings;
use crate::store::BlockStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Versioned block store. `PgBlockStore` in production; tests swap
    /// in the in-memory store.
    pub store: Arc<dyn BlockStore>,
    /// AI capability. BYOK — keys arrive per request.
    pub ai: Arc<dyn AiService>,
    pub config: Config,
    pub render: RenderSettings,
}
