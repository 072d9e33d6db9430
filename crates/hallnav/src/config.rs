//! Client configuration
//!
//! Loaded from `~/.hallnav/config.toml` (or `--config`). Every section is
//! optional; a missing file means defaults. The `[store]` section is the
//! only way to enable the hall directory and the admin panel.

use hallnav_protocol::defaults::{
    DEFAULT_API_BASE_URL, DEFAULT_ROUTING_PROFILE, DEFAULT_ROUTING_SERVICE_URL,
    GEOLOCATION_TIMEOUT_MS, RECOGNITION_TIMEOUT_SECS,
};
use hallnav_protocol::paths::{default_config_path, hallnav_home};
use hallnav_store::{DirStore, HallStore, MemoryStore, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const ENV_API_BASE_URL: &str = "HALLNAV_API_BASE_URL";
pub const ENV_STORE_DIR: &str = "HALLNAV_STORE_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),

    #[error("Failed to open hall store: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,
    pub routing: RoutingConfig,
    pub geolocation: GeolocationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: RECOGNITION_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Directory,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Root for the directory backend. Defaults to the HallNav home.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub service_url: String,
    pub profile: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_ROUTING_SERVICE_URL.to_string(),
            profile: DEFAULT_ROUTING_PROFILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            timeout_ms: GEOLOCATION_TIMEOUT_MS,
        }
    }
}

impl AppConfig {
    /// Load `path`, or the default location when `None`, then apply env overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);
        let mut config = Self::load(&path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|s| !s.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(dir) = lookup(ENV_STORE_DIR).filter(|s| !s.trim().is_empty()) {
            self.store = Some(StoreConfig {
                backend: StoreBackend::Directory,
                path: Some(PathBuf::from(dir)),
            });
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be positive".into()));
        }
        if self.geolocation.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "geolocation.poll_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.geolocation.poll_interval_ms)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation.timeout_ms)
    }

    /// Open the configured hall store. `None` when no store is configured;
    /// callers degrade instead of failing.
    pub fn open_store(&self) -> Result<Option<Arc<dyn HallStore>>, ConfigError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let store: Arc<dyn HallStore> = match store.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Directory => {
                let root = store.path.clone().unwrap_or_else(hallnav_home);
                Arc::new(DirStore::open(root)?)
            }
        };
        Ok(Some(store))
    }
}
