//! File-backed bearer token storage.

use crate::paths::ChatlinePaths;
use async_trait::async_trait;
use chatline_core::auth::TokenStore;
use chatline_core::error::Result;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Stores the bearer token as a single line in `<config_dir>/token`.
///
/// On Unix the file is created with mode 0600.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store at the default token path.
    pub fn new(paths: &ChatlinePaths) -> Self {
        Self::with_path(paths.token_file())
    }

    /// Creates a store with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn open_for_write(&self) -> Result<fs::File> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        Ok(options.open(&self.path).await?)
    }

    #[cfg(unix)]
    async fn restrict_permissions(&self) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        fs::set_permissions(&self.path, permissions).await?;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn restrict_permissions(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = self.open_for_write().await?;
        file.write_all(token.as_bytes()).await?;
        file.flush().await?;
        // Files created before the mode was enforced keep their old bits.
        self.restrict_permissions().await?;
        debug!(path = %self.path.display(), "Stored token");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed token");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> FileTokenStore {
        FileTokenStore::with_path(temp.path().join("chatline").join("token"))
    }

    #[tokio::test]
    async fn test_missing_file_means_no_token() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.save("eyJhbGciOi.token").await.unwrap();
        assert_eq!(
            store.load().await.unwrap(),
            Some("eyJhbGciOi.token".to_string())
        );

        store.save("second").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some("second".to_string()));

        store.clear().await.unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_without_file_succeeds() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        assert!(store.clear().await.is_ok());
    }

    #[tokio::test]
    async fn test_blank_file_means_no_token() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "\n").unwrap();

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.save("secret").await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_existing_token_file_is_tightened() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "old-token-with-more-bytes").unwrap();
        std::fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        store.save("new").await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().await.unwrap(), Some("new".to_string()));
    }
}
