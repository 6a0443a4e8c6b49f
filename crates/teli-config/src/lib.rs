pub mod config;
pub mod paths;

pub use config::{
    Config, ConfigError, FlashConfig, LoggingConfig, OfflineConfig, SearchConfig, ServerConfig,
    DEFAULT_DEBOUNCE_MS, DEFAULT_IMAGE_BASE,
};
pub use paths::{teli_home, PathManager};
