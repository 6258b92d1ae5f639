//! Bearer token storage.

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Durable storage for the single bearer token.
///
/// Any component may read it. Only [`AuthService`](super::AuthService) writes
/// it, so the stored value always matches the last successful login.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Reads the stored token.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(token))`: A token is stored
    /// - `Ok(None)`: Nothing stored
    /// - `Err(_)`: The storage could not be read
    async fn load(&self) -> Result<Option<String>>;

    /// Stores `token`, replacing any previous one.
    async fn save(&self, token: &str) -> Result<()>;

    /// Removes the stored token. Succeeds when nothing was stored.
    async fn clear(&self) -> Result<()>;
}

/// A process-local token store that forgets everything on exit.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.token.read().await.clone())
    }

    async fn save(&self, token: &str) -> Result<()> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.token.write().await = None;
        Ok(())
    }
}
