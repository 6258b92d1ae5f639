//! Composition root: builds the services once and shares them by `Arc`.

use anyhow::{Context, Result};
use chatline_core::auth::{AuthService, TokenStore};
use chatline_core::chat::ChatService;
use chatline_core::config::ClientConfig;
use chatline_core::routing::RouteGuard;
use chatline_infrastructure::{ChatlinePaths, ConfigService, FileTokenStore, HttpBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Paths and config, resolved before the log subscriber exists.
pub struct Settings {
    pub paths: ChatlinePaths,
    pub config: ClientConfig,
    /// `config.toml` was missing and has just been written with defaults
    pub created_config: bool,
}

impl Settings {
    pub fn load(config_dir: Option<PathBuf>) -> Result<Self> {
        let paths = ChatlinePaths::new(config_dir)?;
        paths
            .ensure_config_dir()
            .with_context(|| format!("Failed to create {}", paths.config_dir().display()))?;

        let created_config = !paths.config_file().exists();
        let config = ConfigService::new(&paths)
            .load()
            .context("Failed to load config.toml")?;

        Ok(Self {
            paths,
            config,
            created_config,
        })
    }
}

pub struct App {
    pub config: ClientConfig,
    pub auth: Arc<AuthService>,
    pub chat: Arc<ChatService>,
    pub guard: RouteGuard,
}

impl App {
    /// Builds the services. Call after logging is initialized.
    pub async fn bootstrap(settings: Settings) -> Result<Self> {
        let Settings {
            paths,
            config,
            created_config,
        } = settings;

        let config_file = paths.config_file();
        if created_config {
            info!(path = %config_file.display(), "Created default config");
        } else {
            debug!(path = %config_file.display(), "Loaded config");
        }

        let backend = Arc::new(HttpBackend::new(&config)?);
        let token_store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&paths));

        let chat = Arc::new(ChatService::new(backend.clone(), token_store.clone()));
        let auth = Arc::new(AuthService::restore(backend, token_store.clone(), chat.clone()).await);
        let guard = RouteGuard::new(token_store);

        Ok(Self {
            config,
            auth,
            chat,
            guard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_report_first_run() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("chatline");

        let first = Settings::load(Some(dir.clone())).unwrap();
        assert!(first.created_config);
        assert!(first.paths.config_file().exists());

        let second = Settings::load(Some(dir)).unwrap();
        assert!(!second.created_config);
        assert_eq!(second.config, first.config);
    }

    #[tokio::test]
    async fn test_bootstrap_starts_logged_out_without_token() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load(Some(temp.path().to_path_buf())).unwrap();

        let app = App::bootstrap(settings).await.unwrap();

        assert!(!app.auth.is_authenticated().await);
        assert!(app.chat.sessions().await.is_empty());
    }
}
