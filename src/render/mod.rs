//! Render engine adapter.
//!
//! DESIGN
//! ======
//! The diagram renderer is an external engine with a single process-wide
//! configuration. Callers never touch that configuration directly: they pass a
//! [`LeniencyProfile`] to [`EngineHandle::render`], which applies the profile
//! and renders inside one critical section. Two identities rendering at the
//! same time therefore never see each other's profile.
//!
//! The handle is built once in `main` and cloned into the orchestrator.

pub mod kroki;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by a render attempt.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The engine rejected the diagram text.
    #[error("diagram rejected: {0}")]
    Syntax(String),

    /// The request to the engine failed before a response arrived.
    #[error("render request failed: {0}")]
    Request(String),

    /// The engine answered with an unexpected status.
    #[error("render response error: status {status}")]
    Response { status: u16, body: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Edge curve style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Linear,
    Basis,
}

impl Curve {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Basis => "basis",
        }
    }
}

/// Full engine configuration applied before a render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub theme: &'static str,
    pub font_family: Option<&'static str>,
    /// Render labels as HTML rather than structured text.
    pub html_labels: bool,
    pub curve: Curve,
    pub node_spacing: Option<u32>,
    pub rank_spacing: Option<u32>,
    pub use_max_width: bool,
    pub security_level: &'static str,
    pub log_level: Option<u8>,
}

/// The two configurations the ladder switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeniencyProfile {
    /// Primary and retry tiers.
    Strict,
    /// Safe-fallback tier.
    Lenient,
}

impl LeniencyProfile {
    #[must_use]
    pub fn config(self) -> EngineConfig {
        match self {
            Self::Strict => EngineConfig {
                theme: "default",
                font_family: Some("Inter, Arial, sans-serif"),
                html_labels: false,
                curve: Curve::Linear,
                node_spacing: Some(50),
                rank_spacing: Some(60),
                use_max_width: true,
                security_level: "loose",
                log_level: None,
            },
            Self::Lenient => EngineConfig {
                theme: "default",
                font_family: None,
                html_labels: true,
                curve: Curve::Basis,
                node_spacing: None,
                rank_spacing: None,
                use_max_width: true,
                security_level: "loose",
                log_level: Some(0),
            },
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Markup returned by a successful render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    pub markup: String,
}

/// Outcome of one render call.
pub type RenderAttempt = Result<RenderedDiagram, RenderError>;

/// An external diagram renderer.
///
/// `initialize` replaces the engine-wide configuration used by the next
/// `render` call and must be safe to call repeatedly.
#[async_trait::async_trait]
pub trait RenderEngine: Send + Sync {
    fn initialize(&self, config: &EngineConfig);

    async fn render(&self, key: &str, source: &str) -> RenderAttempt;
}

/// Shared handle that pairs configuration and rendering.
#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<dyn RenderEngine>,
    gate: Arc<Mutex<()>>,
}

impl EngineHandle {
    #[must_use]
    pub fn new(engine: Arc<dyn RenderEngine>) -> Self {
        Self { engine, gate: Arc::new(Mutex::new(())) }
    }

    /// Configure the engine for `profile` and render `source` under `key`.
    ///
    /// # Errors
    ///
    /// Returns the engine's [`RenderError`] unchanged.
    pub async fn render(&self, profile: LeniencyProfile, key: &str, source: &str) -> RenderAttempt {
        let _guard = self.gate.lock().await;
        debug!(?profile, %key, source_len = source.len(), "render: engine call");
        self.engine.initialize(&profile.config());
        self.engine.render(key, source).await
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
