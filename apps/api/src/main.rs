mod ai;
mod config;
mod db;
mod errors;
mod latex;
mod models;
mod render;
mod resolve;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ai::GeminiClient;
use crate::config::Config;
use crate::db::create_pool;
use crate::render::RenderSettings;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgBlockStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Forge API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;

    // Versioned block store
    let store = Arc::new(PgBlockStore::new(pool.clone()));

    // AI client (BYOK — keys arrive per request)
    let ai = Arc::new(GeminiClient::new());
    info!("AI client initialized");

    // Render pipeline settings
    let render = RenderSettings {
        templates_dir: config.templates_dir.clone(),
        compiler: config.latex_compiler.clone(),
        timeout: config.compile_timeout,
        build_root: None,
    };
    info!(
        "Render pipeline: {} with {}s timeout per pass",
        render.compiler,
        render.timeout.as_secs()
    );

    // Build app state
    let state = AppState {
        db: pool,
        store,
        ai,
        config: config.clone(),
        render,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
