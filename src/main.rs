mod config;
mod error;
mod mermaid;
mod render;
mod routes;
mod services;
mod state;
mod view;

use std::sync::Arc;

use crate::config::DeskConfig;
use crate::render::EngineHandle;
use crate::render::kroki::KrokiEngine;
use crate::services::export::ExportClient;
use crate::services::render::RenderService;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = DeskConfig::from_env().expect("invalid configuration");

    let engine = KrokiEngine::new(&config.renderer_url, config.timeouts).expect("render engine init failed");
    tracing::info!(renderer = %config.renderer_url, "render engine initialized");
    let diagrams = RenderService::new(EngineHandle::new(Arc::new(engine)), config.max_diagrams);

    // Export is optional: rendering keeps working without a backend.
    let export = match config.backend_base_url.as_deref() {
        Some(base) => match ExportClient::new(base, &config.drawio_embed_url, config.timeouts) {
            Ok(client) => {
                tracing::info!(backend = %base, "export client initialized");
                Some(client)
            }
            Err(e) => {
                tracing::warn!(error = %e, "export client failed to build; export features disabled");
                None
            }
        },
        None => {
            tracing::warn!("BACKEND_BASE_URL not set; export features disabled");
            None
        }
    };

    let state = state::AppState::new(diagrams, export);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, "diagram-desk listening");
    axum::serve(listener, app).await.expect("server failed");
}
