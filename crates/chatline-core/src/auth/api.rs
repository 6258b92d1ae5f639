//! Authentication backend trait.

use super::model::{LoginGrant, NewAccount};
use crate::error::Result;
use crate::user::User;
use async_trait::async_trait;

/// An abstract authentication backend.
///
/// Non-success responses map to `ChatlineError::Http`, whose message carries
/// the backend's `detail` text when it sent one and is empty otherwise.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a bearer token.
    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant>;

    /// Checks a bearer token and returns the user it belongs to.
    async fn verify(&self, token: &str) -> Result<User>;

    /// Creates an account. Does not log in.
    async fn register(&self, account: &NewAccount) -> Result<User>;
}
