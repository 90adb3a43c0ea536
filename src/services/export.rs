//! Export collaborators — raster download and diagram-editor handoff.
//!
//! Both conversions live on the analysis backend. This client is a thin
//! HTTP wrapper: it forwards the original diagram text, maps failures onto
//! [`ExportError`], and never touches render state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RenderTimeouts;
use crate::error::ErrorCode;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export backend is not configured")]
    NotConfigured,

    #[error("no diagram code to export")]
    NoCode,

    #[error("embedded diagrams cannot be exported")]
    Embedded,

    #[error("export request failed: {0}")]
    Request(String),

    #[error("export backend error: status {status}")]
    Response { status: u16, body: String },

    #[error("editor conversion failed: {0}")]
    Conversion(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for ExportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "E_EXPORT_DISABLED",
            Self::NoCode => "E_NO_CODE",
            Self::Embedded => "E_EMBEDDED",
            Self::Request(_) => "E_EXPORT_REQUEST",
            Self::Response { .. } => "E_EXPORT_RESPONSE",
            Self::Conversion(_) => "E_CONVERSION",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Response { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct CodeRequest<'a> {
    code: &'a str,
}

#[derive(Deserialize)]
struct ConversionResponse {
    success: bool,
    #[serde(default)]
    drawio_xml: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// What a caller needs to open the diagram editor: where to open it and the
/// message to post once the editor reports `ready`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorHandoff {
    pub url: String,
    pub message: String,
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ExportClient {
    http: reqwest::Client,
    base_url: String,
    editor_embed_url: String,
}

impl ExportClient {
    /// Build a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, editor_embed_url: &str, timeouts: RenderTimeouts) -> Result<Self, ExportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ExportError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            editor_embed_url: editor_embed_url.to_owned(),
        })
    }

    /// Rasterize `code` to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend answers non-2xx.
    pub async fn render_png(&self, code: &str) -> Result<Vec<u8>, ExportError> {
        let response = self.post("/api/render_mermaid", code).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExportError::Request(e.to_string()))?;
        debug!(bytes = bytes.len(), "export: png rendered");
        Ok(bytes.to_vec())
    }

    /// Convert `code` into the editor's XML format.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend reports failure.
    pub async fn convert_to_drawio(&self, code: &str) -> Result<String, ExportError> {
        let response = self.post("/api/convert_mermaid_to_drawio", code).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ExportError::Request(e.to_string()))?;
        parse_conversion(&text)
    }

    /// Convert `code` and package the editor handoff.
    ///
    /// # Errors
    ///
    /// See [`ExportClient::convert_to_drawio`].
    pub async fn editor_handoff(&self, code: &str) -> Result<EditorHandoff, ExportError> {
        let xml = self.convert_to_drawio(code).await?;
        Ok(EditorHandoff { url: self.editor_embed_url.clone(), message: load_message(&xml) })
    }

    async fn post(&self, path: &str, code: &str) -> Result<reqwest::Response, ExportError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&CodeRequest { code })
            .send()
            .await
            .map_err(|e| ExportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "export: backend error");
            return Err(ExportError::Response { status: status.as_u16(), body });
        }
        Ok(response)
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_conversion(text: &str) -> Result<String, ExportError> {
    let parsed: ConversionResponse =
        serde_json::from_str(text).map_err(|e| ExportError::Conversion(format!("invalid response: {e}")))?;
    match parsed {
        ConversionResponse { success: true, drawio_xml: Some(xml), .. } if !xml.is_empty() => Ok(xml),
        ConversionResponse { error, .. } => {
            Err(ExportError::Conversion(error.unwrap_or_else(|| "backend returned no diagram".into())))
        }
    }
}

/// The editor's `load` action for `xml`.
fn load_message(xml: &str) -> String {
    serde_json::json!({ "action": "load", "xml": xml }).to_string()
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
