//! Unified path management for Chatline files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/chatline/          # Config directory (dirs::config_dir)
//! ├── config.toml              # Client configuration
//! ├── token                    # Bearer token (0600)
//! └── logs/                    # Application logs
//!     └── chatline.log.YYYY-MM-DD
//! ```

use chatline_core::error::{ChatlineError, Result};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "chatline";
const CONFIG_FILE_NAME: &str = "config.toml";
const TOKEN_FILE_NAME: &str = "token";
const LOGS_DIR_NAME: &str = "logs";

/// Resolves every path Chatline reads or writes.
///
/// The base directory can be overridden, which tests use to stay inside a
/// temporary directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatlinePaths {
    base: PathBuf,
}

impl ChatlinePaths {
    /// Creates paths rooted at `base_override`, or at the platform config
    /// directory when `None`.
    ///
    /// # Errors
    ///
    /// Returns `ChatlineError::Config` if the platform config directory cannot
    /// be determined.
    pub fn new(base_override: Option<PathBuf>) -> Result<Self> {
        let base = match base_override {
            Some(base) => base,
            None => dirs::config_dir()
                .ok_or_else(|| ChatlineError::config("Cannot find config directory"))?
                .join(APP_DIR_NAME),
        };
        Ok(Self { base })
    }

    pub fn config_dir(&self) -> &Path {
        &self.base
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join(CONFIG_FILE_NAME)
    }

    pub fn token_file(&self) -> PathBuf {
        self.base.join(TOKEN_FILE_NAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base.join(LOGS_DIR_NAME)
    }

    /// Creates the config directory if it does not exist.
    pub fn ensure_config_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base)?;
        Ok(())
    }
}
