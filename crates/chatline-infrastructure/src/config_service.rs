//! Configuration service implementation.
//!
//! Loads [`ClientConfig`] from `~/.config/chatline/config.toml`, writing the
//! defaults on first run, and applies environment overrides.

use crate::paths::ChatlinePaths;
use chatline_core::config::ClientConfig;
use chatline_core::error::Result;
use std::path::PathBuf;
use tracing::{debug, info};

/// Overrides `base_url` when set.
pub const BASE_URL_ENV: &str = "CHATLINE_BASE_URL";
/// Overrides `log_level` when set.
pub const LOG_LEVEL_ENV: &str = "CHATLINE_LOG_LEVEL";

/// Reads and writes `config.toml`.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(paths: &ChatlinePaths) -> Self {
        Self::with_path(paths.config_file())
    }

    /// Creates a service with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the file config and applies process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written, is not valid
    /// TOML, or the resulting config fails validation.
    pub fn load(&self) -> Result<ClientConfig> {
        let config = apply_env_overrides(self.load_file()?, |key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Loads the file config, creating it with defaults when missing.
    pub fn load_file(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            let config = ClientConfig::default();
            self.save(&config)?;
            info!(path = %self.path.display(), "Created default config");
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let config: ClientConfig = toml::from_str(&contents)?;
        debug!(path = %self.path.display(), "Loaded config");
        Ok(config)
    }

    pub fn save(&self, config: &ClientConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// Applies `CHATLINE_*` overrides read through `lookup`. Blank values are
/// ignored.
pub fn apply_env_overrides<F>(mut config: ClientConfig, lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(base_url) = non_blank(BASE_URL_ENV) {
        debug!(%base_url, "Overriding base_url from environment");
        config.base_url = base_url;
    }
    if let Some(log_level) = non_blank(LOG_LEVEL_ENV) {
        config.log_level = log_level;
    }
    config
}
