use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{GatewayError, Result};

/// Main configuration structure for ossgate
///
/// Built once at startup and shared read-only with every request.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Listening socket configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream ChatKit endpoint configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Models exposed through `/v1/models` and accepted by the gateway
    #[serde(default)]
    pub models: ModelsConfig,
}

impl Config {
    /// Load configuration from an explicit path, or probe the default
    /// locations and fall back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(path);
        }

        let default_paths = [
            dirs::home_dir().map(|h| h.join(".ossgate").join("config.toml")),
            dirs::config_dir().map(|c| c.join("ossgate").join("config.toml")),
            Some(PathBuf::from("config.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {e}")))
    }

    /// Check cross-field constraints that serde defaults cannot express
    pub fn validate(&self) -> Result<()> {
        self.server
            .listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| GatewayError::Config(format!("Invalid listen address: {e}")))?;

        let url = Url::parse(&self.upstream.url).map_err(|e| {
            GatewayError::Config(format!("Invalid upstream URL '{}': {e}", self.upstream.url))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(GatewayError::Config(format!(
                "Unsupported upstream URL scheme '{}': only http and https are allowed",
                url.scheme()
            )));
        }

        if self.models.supported.is_empty() {
            return Err(GatewayError::Config(
                "At least one supported model is required".to_string(),
            ));
        }
        if !self.models.is_supported(&self.models.default) {
            return Err(GatewayError::Config(format!(
                "Default model '{}' is not in the supported model list",
                self.models.default
            )));
        }

        Ok(())
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8787")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8787".to_string()
}

/// Upstream ChatKit configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// ChatKit endpoint receiving thread operations
    #[serde(default = "default_upstream_url")]
    pub url: String,
    /// Whole-request timeout in seconds; unset leaves transport defaults in place
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Keep reading the upstream body after the finish event instead of
    /// closing the connection. Output is identical either way.
    #[serde(default)]
    pub drain_after_finish: bool,
    /// Fixed headers sent with every upstream request
    #[serde(default = "default_upstream_headers")]
    pub headers: BTreeMap<String, String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout_secs: None,
            drain_after_finish: false,
            headers: default_upstream_headers(),
        }
    }
}

fn default_upstream_url() -> String {
    "https://api.gpt-oss.com/chatkit".to_string()
}

fn default_upstream_headers() -> BTreeMap<String, String> {
    [
        ("accept", "text/event-stream"),
        (
            "accept-language",
            "ms-MY,ms;q=0.9,en-US;q=0.8,en;q=0.7,id;q=0.6",
        ),
        ("content-type", "application/json"),
        ("origin", "https://gpt-oss.com"),
        ("referer", "https://gpt-oss.com/"),
        ("sec-ch-ua", r#""Not A(Brand";v="8", "Chromium";v="132""#),
        ("sec-ch-ua-mobile", "?1"),
        ("sec-ch-ua-platform", r#""Android""#),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "same-site"),
        (
            "user-agent",
            "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTMLFg, silike FGeckosi) Chrome/132.0.0.0 Mobile Safari/537.36.fgsi",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Model catalogue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Model identifiers accepted on `/v1/chat/completions`
    #[serde(default = "default_supported_models")]
    pub supported: Vec<String>,
    /// Model used when the request names none
    #[serde(default = "default_model")]
    pub default: String,
    /// `owned_by` reported in the model listing
    #[serde(default = "default_owned_by")]
    pub owned_by: String,
}

impl ModelsConfig {
    pub fn is_supported(&self, model: &str) -> bool {
        self.supported.iter().any(|m| m == model)
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            supported: default_supported_models(),
            default: default_model(),
            owned_by: default_owned_by(),
        }
    }
}

fn default_supported_models() -> Vec<String> {
    vec!["gpt-oss-120b".to_string(), "gpt-oss-20b".to_string()]
}

fn default_model() -> String {
    "gpt-oss-120b".to_string()
}

fn default_owned_by() -> String {
    "gpt-oss".to_string()
}
