pub mod add;
pub mod config;
pub mod import;
pub mod live;
pub mod offline;
pub mod prompts;
pub mod render;
pub mod search;
pub mod ui;

use color_eyre::eyre::{eyre, Result};
use std::path::{Path, PathBuf};
use teli_client::HttpClient;
use teli_config::{Config, PathManager};

/// Everything a command needs from the environment
pub struct Context {
    pub paths: PathManager,
    pub config_file: PathBuf,
    pub config: Config,
}

impl Context {
    /// Load and validate the config, from `override_file` when given. A
    /// missing file means defaults.
    pub fn load(override_file: Option<&Path>) -> Result<Self> {
        let paths = PathManager::default();
        let config_file = override_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| paths.config_file());

        let config = Config::load_or_default(&config_file).map_err(|e| {
            eyre!("Failed to load config from {}: {}", config_file.display(), e)
        })?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

        Ok(Self {
            paths,
            config_file,
            config,
        })
    }

    pub fn client(&self) -> Result<HttpClient> {
        HttpClient::from_config(&self.config.server)
            .map_err(|e| eyre!("Failed to create HTTP client: {}", e))
    }
}
