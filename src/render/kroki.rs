//! Kroki-compatible HTTP rendering engine.
//!
//! Thin HTTP wrapper for `POST {base}/mermaid/svg`. The configuration applied
//! by `initialize` travels with each request as `diagram_options`, so the
//! service itself stays stateless. Pure option mapping in `diagram_options`
//! for testability.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use super::{EngineConfig, LeniencyProfile, RenderAttempt, RenderEngine, RenderError, RenderedDiagram};
use crate::config::RenderTimeouts;

// =============================================================================
// CLIENT
// =============================================================================

pub struct KrokiEngine {
    http: reqwest::Client,
    endpoint: String,
    config: Mutex<EngineConfig>,
}

impl KrokiEngine {
    /// Build an engine for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, timeouts: RenderTimeouts) -> Result<Self, RenderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| RenderError::HttpClientBuild(e.to_string()))?;
        let endpoint = format!("{}/mermaid/svg", base_url.trim_end_matches('/'));
        Ok(Self { http, endpoint, config: Mutex::new(LeniencyProfile::Strict.config()) })
    }

    fn current_config(&self) -> EngineConfig {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl RenderEngine for KrokiEngine {
    fn initialize(&self, config: &EngineConfig) {
        *self
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = config.clone();
    }

    async fn render(&self, key: &str, source: &str) -> RenderAttempt {
        let options = diagram_options(&self.current_config());
        let body = ApiRequest { diagram_source: source, diagram_options: &options };
        debug!(%key, endpoint = %self.endpoint, "kroki: render request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| RenderError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| RenderError::Request(e.to_string()))?;

        parse_response(status, text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct ApiRequest<'a> {
    diagram_source: &'a str,
    diagram_options: &'a BTreeMap<&'static str, String>,
}

// =============================================================================
// PARSING
// =============================================================================

/// Map an engine configuration onto Kroki's mermaid diagram options.
fn diagram_options(config: &EngineConfig) -> BTreeMap<&'static str, String> {
    let mut options = BTreeMap::new();
    options.insert("theme", config.theme.to_owned());
    options.insert("security-level", config.security_level.to_owned());
    options.insert("flowchart_html-labels", config.html_labels.to_string());
    options.insert("flowchart_curve", config.curve.as_str().to_owned());
    options.insert("flowchart_use-max-width", config.use_max_width.to_string());
    if let Some(font) = config.font_family {
        options.insert("font-family", font.to_owned());
    }
    if let Some(spacing) = config.node_spacing {
        options.insert("flowchart_node-spacing", spacing.to_string());
    }
    if let Some(spacing) = config.rank_spacing {
        options.insert("flowchart_rank-spacing", spacing.to_string());
    }
    if let Some(level) = config.log_level {
        options.insert("log-level", level.to_string());
    }
    options
}

fn parse_response(status: u16, body: String) -> RenderAttempt {
    match status {
        200 => Ok(RenderedDiagram { markup: body }),
        400 => Err(RenderError::Syntax(body)),
        _ => Err(RenderError::Response { status, body }),
    }
}

#[cfg(test)]
#[path = "kroki_test.rs"]
mod tests;
