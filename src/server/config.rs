//! Server configuration types.
//!
//! Loaded from an optional `ragsearch.toml` layered under `RAGSEARCH_*`
//! environment overrides (e.g. `RAGSEARCH_SERVER__PORT=9000`). The Cohere
//! credential is read from `COHERE_API_KEY` like every other Cohere
//! client, not from the config file.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener
    pub server: ServerConfig,
    /// Embedding provider selection
    pub embedding: EmbeddingConfig,
    /// Origins allowed by the CORS layer; `["*"]` means any
    pub cors_origins: Vec<String>,
    /// Logging configuration
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            embedding: EmbeddingConfig::default(),
            cors_origins: vec!["*".to_string()],
            log: LogConfig::default(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"cohere"` (remote, needs `COHERE_API_KEY`) or `"hash"`
    /// (deterministic local provider for demos and tests)
    pub provider: String,
    /// Model identifier for the remote provider
    pub model: Option<String>,
    /// Output dimension for the local hash provider
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "cohere".to_string(),
            model: None,
            dimension: ragsearch_embed::hash::DEFAULT_DIMENSION,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level: trace, debug, info, warn, error
    pub level: String,
    /// Output format: `console` or `json`
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Console,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console output
    Console,
    /// Structured JSON lines
    Json,
}

impl AppConfig {
    /// Load configuration: `ragsearch.toml` if present, then environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("ragsearch").required(false))
            .add_source(Environment::with_prefix("RAGSEARCH").separator("__"))
            .build()
            .context("failed to read configuration")?;
        config
            .try_deserialize()
            .context("failed to parse configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Console);
        assert_eq!(config.embedding.provider, "cohere");
    }

    #[test]
    fn test_log_format_parse() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
