//! Configuration management.
//!
//! Loads settings from `cloud-explorer.toml` (or a path given on the command
//! line) and falls back to defaults when the file does not exist.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::provider::{Provider, BIG_THREE};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "cloud-explorer.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Where provider detection requests go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Idle sessions older than this are evicted
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Providers summed into the headline share
    #[serde(default = "default_big_three")]
    pub big_three: Vec<Provider>,

    /// CSV replacing the built-in catalog
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

fn default_endpoint() -> String {
    "http://localhost:8080/api/detect-cloud".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_session_ttl() -> u64 {
    30 * 60
}

fn default_big_three() -> Vec<Provider> {
    BIG_THREE.to_vec()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            big_three: default_big_three(),
            catalog_path: None,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ServerConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

impl Config {
    /// Load from `path`, or `DEFAULT_CONFIG_PATH` when none is given.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

        match fs::read_to_string(path) {
            Ok(text) => {
                let config = Config::from_toml(&text)?;
                info!("Loaded config from {:?}", path);
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("No config at {:?}, using defaults", path);
                Ok(Config::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(text)?;

        // A provider listed twice would be counted twice in the share
        let mut seen = Vec::with_capacity(config.dashboard.big_three.len());
        for provider in &config.dashboard.big_three {
            if seen.contains(provider) {
                warn!("Ignoring duplicate {} in dashboard.big_three", provider);
            } else {
                seen.push(*provider);
            }
        }
        config.dashboard.big_three = seen;

        Ok(config)
    }
}
