//! Resume generation: resolve the composition request, assemble
//! fragments, compile, return the PDF.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::compose::CompositionRequest;
use crate::render::render_pdf;
use crate::resolve::resolve;
use crate::routes::owner_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub resume_config: CompositionRequest,
}

/// POST /api/v1/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<GenerateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = owner_id(&headers)?;

    let doc = resolve(state.store.as_ref(), owner, &req.resume_config).await?;
    if doc.is_empty() {
        info!("Composition for owner {owner} resolved to no content; skeleton defaults will render");
    } else {
        info!(
            "Resolved composition for owner {owner}: {} experiences, {} projects",
            doc.experiences.len(),
            doc.projects.len()
        );
    }

    let pdf = render_pdf(&state.render, &doc).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=resume.pdf",
            ),
        ],
        pdf,
    ))
}
