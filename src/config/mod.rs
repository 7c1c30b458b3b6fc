//! Configuration management: a TOML file with validated defaults,
//! loaded at startup and written out by `petden init`.
//!
//! Sections:
//! - `[server]` - bind address for the TCP gateway
//! - `[storage]` - data directory for the embedded store
//! - `[game]` - engine tunables (listing limit, name length cap)
//! - `[logging]` - log level

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the TCP gateway binds to.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:4650".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the sled database.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/petden".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameTuning {
    /// Maximum entries returned by a marketplace listing.
    #[serde(default = "default_offer_listing_limit")]
    pub offer_listing_limit: usize,
    /// Maximum accepted length for player and pet names.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

fn default_offer_listing_limit() -> usize {
    20
}

fn default_max_name_length() -> usize {
    32
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            offer_listing_limit: default_offer_listing_limit(),
            max_name_length: default_max_name_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, or trace.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub game: GameTuning,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load and validate a configuration file.
    pub async fn load(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("cannot read config {}: {}", path, e))?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Write a default configuration file, refusing to overwrite.
    pub async fn create_default(path: &str) -> Result<()> {
        if fs::try_exists(path).await? {
            return Err(anyhow!("config file {} already exists", path));
        }
        let rendered = toml::to_string_pretty(&Config::default())?;
        fs::write(path, rendered).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            return Err(anyhow!("server.bind must not be empty"));
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.game.offer_listing_limit == 0 {
            return Err(anyhow!("game.offer_listing_limit must be positive"));
        }
        if self.game.max_name_length == 0 {
            return Err(anyhow!("game.max_name_length must be positive"));
        }
        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            other => Err(anyhow!("unknown logging.level: {}", other)),
        }
    }
}
