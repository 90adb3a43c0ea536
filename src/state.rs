//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the render service, which owns every live diagram identity, and the
//! optional export client. Export is absent when no backend is configured;
//! rendering never depends on it.

use std::sync::Arc;

use crate::services::export::ExportClient;
use crate::services::render::RenderService;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub diagrams: RenderService,
    pub export: Option<Arc<ExportClient>>,
}

impl AppState {
    #[must_use]
    pub fn new(diagrams: RenderService, export: Option<ExportClient>) -> Self {
        Self { diagrams, export: export.map(Arc::new) }
    }
}
