use crate::common::constants;
use crate::common::error::{MarketError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub commerce: CommerceConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommerceConfig {
    /// Download attempts allowed per completed order
    #[serde(default = "default_max_downloads")]
    pub max_downloads: u32,
    /// Days from purchase until the download window closes
    #[serde(default = "default_entitlement_days")]
    pub entitlement_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_max_downloads() -> u32 {
    constants::DEFAULT_MAX_DOWNLOADS
}

fn default_entitlement_days() -> i64 {
    constants::DEFAULT_ENTITLEMENT_DAYS
}

fn default_port() -> u16 {
    constants::DEFAULT_SERVER_PORT
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            max_downloads: default_max_downloads(),
            entitlement_days: default_entitlement_days(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("CODEMART_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            MarketError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Falls back to built-in defaults when no config file is present.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                info!("Using default configuration: {}", e);
                Config::default()
            }
        }
    }
}
