//! Config file handling
//!
//! Configuration lives in `<config dir>/chainpulse/config.toml`:
//!
//! ```toml
//! [server]
//! base_url = "http://localhost:5000"
//! timeout = "30s"
//!
//! [server.headers]
//! Authorization = "Bearer secret"
//!
//! [output]
//! pretty = true
//! colors = true
//! collapse_threshold = 5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{ChainpulseError, Result};

/// Backend used when neither config nor flags name one
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Objects with more keys than this render collapsed
pub const DEFAULT_COLLAPSE_THRESHOLD: usize = 5;

/// Backend connection settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub base_url: Url,
    /// No timeout unless configured
    pub timeout: Option<Duration>,
    /// Extra headers sent with every backend call
    pub headers: IndexMap<String, String>,
}

/// Display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub pretty: bool,
    #[serde(default = "default_true")]
    pub colors: bool,
    #[serde(default = "default_collapse_threshold")]
    pub collapse_threshold: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            colors: true,
            collapse_threshold: DEFAULT_COLLAPSE_THRESHOLD,
        }
    }
}

/// ChainPulse configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub config_dir: PathBuf,
    pub server: ServerConfig,
    pub output: OutputConfig,
}

/// On-disk shape of the config file
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    server: RawServerConfig,
    #[serde(default)]
    output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
struct RawServerConfig {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    timeout: Option<String>,
    #[serde(default)]
    headers: IndexMap<String, String>,
}

fn default_true() -> bool {
    true
}

fn default_collapse_threshold() -> usize {
    DEFAULT_COLLAPSE_THRESHOLD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: Self::default_config_dir(),
            server: ServerConfig {
                base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
                timeout: None,
                headers: IndexMap::new(),
            },
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_dir = Self::default_config_dir();
        let (config_file, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (config_dir.join("config.toml"), false),
        };

        if !config_file.exists() {
            if explicit {
                return Err(ChainpulseError::Config(format!(
                    "Config file not found: {}",
                    config_file.display()
                )));
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_file)
            .map_err(|e| ChainpulseError::Config(format!("Failed to read config: {}", e)))?;

        let mut config = Self::from_toml(&content)?;
        config.config_dir = config_dir;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| ChainpulseError::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();
        if let Some(ref base_url) = raw.server.base_url {
            config.set_base_url(base_url)?;
        }
        if let Some(ref timeout) = raw.server.timeout {
            config.set_timeout(timeout)?;
        }
        config.server.headers = raw.server.headers;
        config.output = raw.output;
        Ok(config)
    }

    /// Override the backend root URL
    pub fn set_base_url(&mut self, base_url: &str) -> Result<()> {
        let url = Url::parse(base_url)
            .map_err(|e| ChainpulseError::Config(format!("Invalid base_url '{}': {}", base_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(ChainpulseError::Config(format!("base_url '{}' cannot be a base URL", base_url)));
        }
        self.server.base_url = url;
        Ok(())
    }

    /// Override the request timeout from a human duration such as `30s` or `1m`
    pub fn set_timeout(&mut self, timeout: &str) -> Result<()> {
        let duration = humantime::parse_duration(timeout.trim())
            .map_err(|e| ChainpulseError::Config(format!("Invalid timeout '{}': {}", timeout, e)))?;
        self.server.timeout = Some(duration);
        Ok(())
    }

    /// Get the default config directory
    fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("chainpulse"))
            .unwrap_or_else(|| PathBuf::from(".chainpulse"))
    }
}
