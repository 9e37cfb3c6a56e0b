//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/lf.sqlite"
//!
//! [matching]
//! limit = 5
//! require_non_empty = false
//!
//! [server]
//! bind = "127.0.0.1:7340"
//!
//! [logging]
//! level = "warn"
//! ```
//!
//! `[matching]` and `[logging]` are optional.

use anyhow::{Context, Result};
use lostfound_core::matcher::{MatchParams, DEFAULT_MATCH_LIMIT};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Only let the name/description signals fire on non-empty text.
    #[serde(default)]
    pub require_non_empty: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            require_non_empty: false,
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_MATCH_LIMIT
}

impl MatchingConfig {
    /// Build matcher parameters, applying per-call overrides.
    pub fn params(&self, limit: Option<usize>, strict: bool, explain: bool) -> MatchParams {
        MatchParams {
            limit: limit.unwrap_or(self.limit),
            require_non_empty: strict || self.require_non_empty,
            explain,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.matching.limit < 1 {
        anyhow::bail!("matching.limit must be >= 1");
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(config)
}
