//! Diagram routes — present, inspect, view, and export diagram identities.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{Html, IntoResponse, Json, Response};
use serde::Deserialize;
use tracing::warn;

use crate::error::{ErrorCode, error_response};
use crate::mermaid::DiagramSource;
use crate::services::export::{EditorHandoff, ExportClient, ExportError};
use crate::services::render::RenderState;
use crate::state::AppState;
use crate::view;

const MAX_ID_LEN: usize = 64;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    #[error("invalid diagram id: {0}")]
    InvalidId(String),

    #[error("diagram not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ErrorCode for DiagramError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "E_INVALID_ID",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Export(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Export(e) => e.retryable(),
            _ => false,
        }
    }
}

impl DiagramError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Export(ExportError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Export(ExportError::NoCode) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Export(ExportError::Embedded) => StatusCode::CONFLICT,
            Self::Export(ExportError::HttpClientBuild(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Export(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for DiagramError {
    fn into_response(self) -> Response {
        error_response(self.status(), &self)
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct PresentBody {
    #[serde(default)]
    pub code: String,
}

/// `PUT /api/diagrams/:id` — present diagram text under `id`.
pub async fn present_diagram(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PresentBody>,
) -> Result<(StatusCode, Json<RenderState>), DiagramError> {
    validate_id(&id)?;
    // The ladder task runs detached; callers poll GET for the outcome.
    let _ladder = state.diagrams.present(&id, &body.code).await;
    let current = current_state(&state, &id).await?;
    Ok((StatusCode::ACCEPTED, Json(current)))
}

/// `GET /api/diagrams/:id` — current render state.
pub async fn get_diagram(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RenderState>, DiagramError> {
    validate_id(&id)?;
    Ok(Json(current_state(&state, &id).await?))
}

/// `DELETE /api/diagrams/:id` — dismiss the identity.
pub async fn dismiss_diagram(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, DiagramError> {
    validate_id(&id)?;
    if state.diagrams.dismiss(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(DiagramError::NotFound(id))
    }
}

/// `GET /api/diagrams/:id/view` — HTML view.
pub async fn view_diagram(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, DiagramError> {
    validate_id(&id)?;
    let current = current_state(&state, &id).await?;
    Ok(Html(view::render_page(&id, &current, state.export.is_some())))
}

/// `GET /api/diagrams/:id/png` — raster download.
pub async fn download_png(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, DiagramError> {
    let (export, code) = export_source(&state, &id).await?;
    let png = export.render_png(&code).await.inspect_err(|e| {
        warn!(%id, error = %e, "export: png failed");
    })?;
    let disposition = format!("attachment; filename=\"{id}.png\"");
    Ok(([(CONTENT_TYPE, "image/png".to_owned()), (CONTENT_DISPOSITION, disposition)], png).into_response())
}

/// `POST /api/diagrams/:id/drawio` — editor handoff payload.
pub async fn open_in_editor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EditorHandoff>, DiagramError> {
    let (export, code) = export_source(&state, &id).await?;
    let handoff = export.editor_handoff(&code).await.inspect_err(|e| {
        warn!(%id, error = %e, "export: editor handoff failed");
    })?;
    Ok(Json(handoff))
}

// =============================================================================
// HELPERS
// =============================================================================

fn validate_id(id: &str) -> Result<(), DiagramError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid { Ok(()) } else { Err(DiagramError::InvalidId(id.to_owned())) }
}

async fn current_state(state: &AppState, id: &str) -> Result<RenderState, DiagramError> {
    state
        .diagrams
        .state(id)
        .await
        .ok_or_else(|| DiagramError::NotFound(id.to_owned()))
}

/// Export client plus the original diagram text for `id`.
async fn export_source(state: &AppState, id: &str) -> Result<(Arc<ExportClient>, String), DiagramError> {
    validate_id(id)?;
    let source = state
        .diagrams
        .source(id)
        .await
        .ok_or_else(|| DiagramError::NotFound(id.to_owned()))?;
    let export = state.export.clone().ok_or(ExportError::NotConfigured)?;
    match source {
        DiagramSource::Mermaid(code) => Ok((export, code)),
        DiagramSource::Embed(_) => Err(ExportError::Embedded.into()),
        DiagramSource::Empty => Err(ExportError::NoCode.into()),
    }
}

#[cfg(test)]
#[path = "diagrams_test.rs"]
mod tests;
