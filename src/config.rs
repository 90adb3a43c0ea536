//! Service configuration parsed from environment variables.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RENDERER_URL: &str = "https://kroki.io";
pub const DEFAULT_RENDER_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RENDER_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_DIAGRAMS: usize = 1024;
pub const DEFAULT_DRAWIO_EMBED_URL: &str =
    "https://embed.diagrams.net/?embed=1&ui=min&proto=json&spin=1&libraries=1&configure=1";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskConfig {
    pub port: u16,
    pub renderer_url: String,
    pub timeouts: RenderTimeouts,
    /// Analysis backend hosting the raster and editor conversions.
    pub backend_base_url: Option<String>,
    pub drawio_embed_url: String,
    /// Settled diagrams kept before the oldest are evicted.
    pub max_diagrams: usize,
}

impl DeskConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `RENDERER_URL`: Kroki-compatible renderer, default `https://kroki.io`
    /// - `RENDER_REQUEST_TIMEOUT_SECS`: default 30
    /// - `RENDER_CONNECT_TIMEOUT_SECS`: default 10
    /// - `BACKEND_BASE_URL`: export features disabled when absent
    /// - `DRAWIO_EMBED_URL`: diagram editor embed page
    /// - `MAX_DIAGRAMS`: default 1024
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but not a valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value: raw })?,
            Err(_) => DEFAULT_PORT,
        };

        let renderer_url = base_url(std::env::var("RENDERER_URL").ok()).unwrap_or_else(|| DEFAULT_RENDERER_URL.into());
        let backend_base_url = base_url(std::env::var("BACKEND_BASE_URL").ok());
        let drawio_embed_url = std::env::var("DRAWIO_EMBED_URL").unwrap_or_else(|_| DEFAULT_DRAWIO_EMBED_URL.into());
        let timeouts = RenderTimeouts {
            request_secs: env_parse_u64("RENDER_REQUEST_TIMEOUT_SECS", DEFAULT_RENDER_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("RENDER_CONNECT_TIMEOUT_SECS", DEFAULT_RENDER_CONNECT_TIMEOUT_SECS),
        };

        let max_diagrams = std::env::var("MAX_DIAGRAMS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_DIAGRAMS);

        Ok(Self { port, renderer_url, timeouts, backend_base_url, drawio_embed_url, max_diagrams })
    }
}

fn base_url(raw: Option<String>) -> Option<String> {
    raw.map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
