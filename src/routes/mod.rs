//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the diagram API and the HTML view under a single Axum
//! router. Callers present diagram text with `PUT`, then poll the JSON state
//! or open the view page.

pub mod diagrams;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/diagrams/{id}",
            put(diagrams::present_diagram)
                .get(diagrams::get_diagram)
                .delete(diagrams::dismiss_diagram),
        )
        .route("/api/diagrams/{id}/view", get(diagrams::view_diagram))
        .route("/api/diagrams/{id}/png", get(diagrams::download_png))
        .route("/api/diagrams/{id}/drawio", post(diagrams::open_in_editor))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
