use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Quiet period before a search is issued, for both the overlay and inline rows
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;

/// TMDB poster base (w500 = 500px wide)
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub flash: FlashConfig,
    #[serde(default)]
    pub offline: OfflineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_overview_chars")]
    pub overview_chars: usize,
    #[serde(default = "default_image_base")]
    pub image_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlashConfig {
    #[serde(default = "default_dismiss_after_ms")]
    pub dismiss_after_ms: u64,
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfflineConfig {
    #[serde(default = "default_cache_version")]
    pub cache_version: String,
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,
    #[serde(default = "default_worker_path")]
    pub worker_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json_logging")]
    pub json: bool,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("server.base_url must be an absolute http(s) URL, got {0:?}")]
    InvalidBaseUrl(String),
    #[error("search.debounce_ms must be greater than zero")]
    ZeroDebounce,
    #[error("search.overview_chars must be greater than zero")]
    ZeroOverviewChars,
    #[error("offline.cache_version cannot be empty")]
    EmptyCacheVersion,
    #[error("offline.cache_version must be a plain directory name, got {0:?}")]
    UnsafeCacheVersion(String),
    #[error("offline asset path must start with '/': {0}")]
    RelativeAsset(String),
}

fn default_base_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_overview_chars() -> usize {
    150
}

fn default_image_base() -> String {
    DEFAULT_IMAGE_BASE.to_string()
}

fn default_dismiss_after_ms() -> u64 {
    4000
}

fn default_fade_ms() -> u64 {
    300
}

fn default_cache_version() -> String {
    "teli-v1".to_string()
}

fn default_assets() -> Vec<String> {
    vec!["/static/style.css".to_string(), "/static/app.js".to_string()]
}

fn default_worker_path() -> String {
    "/sw.js".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logging() -> bool {
    use std::io::IsTerminal;
    !std::io::stdout().is_terminal()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            overview_chars: default_overview_chars(),
            image_base: default_image_base(),
        }
    }
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: default_dismiss_after_ms(),
            fade_ms: default_fade_ms(),
        }
    }
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            assets: default_assets(),
            worker_path: default_worker_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json_logging(),
            file: None,
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl FlashConfig {
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.dismiss_after_ms)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, falling back to defaults when it does not exist yet
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::load_from_file(path)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.server.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.server.base_url.clone()));
        }

        if self.search.debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        if self.search.overview_chars == 0 {
            return Err(ConfigError::ZeroOverviewChars);
        }

        if self.offline.cache_version.trim().is_empty() {
            return Err(ConfigError::EmptyCacheVersion);
        }
        let version = self.offline.cache_version.as_str();
        if matches!(version, "." | "..") || version.contains(['/', '\\']) {
            return Err(ConfigError::UnsafeCacheVersion(version.to_string()));
        }
        if let Some(asset) = self.offline.assets.iter().find(|a| !a.starts_with('/')) {
            return Err(ConfigError::RelativeAsset(asset.clone()));
        }

        Ok(())
    }
}
