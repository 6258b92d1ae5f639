use super::api::AuthApi;
use super::model::{AuthState, LOGIN_FAILED_MESSAGE, LoginOutcome, NewAccount};
use super::token_store::TokenStore;
use crate::chat::ChatService;
use crate::error::{ChatlineError, Result};
use crate::user::User;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Owns the current user and bearer token.
///
/// `AuthService` is the only writer of the [`TokenStore`]. A successful login
/// loads the user's chat sessions and a logout clears them, so it holds the
/// shared [`ChatService`].
pub struct AuthService {
    state: RwLock<AuthState>,
    api: Arc<dyn AuthApi>,
    token_store: Arc<dyn TokenStore>,
    chat: Arc<ChatService>,
}

impl AuthService {
    /// Creates an unauthenticated `AuthService`.
    pub fn new(
        api: Arc<dyn AuthApi>,
        token_store: Arc<dyn TokenStore>,
        chat: Arc<ChatService>,
    ) -> Self {
        Self {
            state: RwLock::new(AuthState::default()),
            api,
            token_store,
            chat,
        }
    }

    /// Creates an `AuthService` initialized from the stored token.
    ///
    /// A store that cannot be read is logged and treated as empty. The user
    /// stays unknown until [`check_auth`](Self::check_auth) or a login.
    pub async fn restore(
        api: Arc<dyn AuthApi>,
        token_store: Arc<dyn TokenStore>,
        chat: Arc<ChatService>,
    ) -> Self {
        let token = match token_store.load().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token; starting logged out");
                None
            }
        };
        debug!(has_token = token.is_some(), "Restored auth state");

        let service = Self::new(api, token_store, chat);
        service.state.write().await.token = token;
        service
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// Logs in with a username and password.
    ///
    /// On success the token is persisted, the state updated and the user's
    /// sessions loaded. A session load failure is logged and does not fail
    /// the login.
    ///
    /// Never returns an error: every failure becomes
    /// [`LoginOutcome::Failure`] carrying the backend's detail message or
    /// [`LOGIN_FAILED_MESSAGE`].
    pub async fn login(&self, username: &str, password: &str) -> LoginOutcome {
        info!(username, "Logging in");

        let grant = match self.api.login(username, password).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(username, error = %e, "Login rejected");
                return LoginOutcome::failure(failure_message(&e));
            }
        };

        if let Err(e) = self.token_store.save(&grant.access_token).await {
            error!(error = %e, "Failed to persist token");
            return LoginOutcome::failure(LOGIN_FAILED_MESSAGE);
        }

        {
            let mut state = self.state.write().await;
            state.token = Some(grant.access_token);
            state.user = Some(grant.user);
        }

        if let Err(e) = self.chat.load_sessions().await {
            warn!(error = %e, "Logged in but failed to load sessions");
        }

        info!(username, "Logged in");
        LoginOutcome::Success
    }

    /// Logs in without contacting the backend.
    ///
    /// Development bypass: fabricates [`User::mock`] and a timestamped token,
    /// persisting it like a real login. Sessions are not loaded.
    pub async fn mock_login(&self, username: &str) -> LoginOutcome {
        let token = format!("mock-token-{}", Utc::now().timestamp_millis());

        if let Err(e) = self.token_store.save(&token).await {
            error!(error = %e, "Failed to persist mock token");
            return LoginOutcome::failure(LOGIN_FAILED_MESSAGE);
        }

        let mut state = self.state.write().await;
        state.token = Some(token);
        state.user = Some(User::mock(username));
        info!(username, "Logged in with mock credentials");
        LoginOutcome::Success
    }

    /// Clears chat data, the auth state and the stored token.
    ///
    /// Never contacts the backend. A token store failure is logged only.
    pub async fn logout(&self) {
        self.chat.clear_all_data().await;

        {
            let mut state = self.state.write().await;
            state.user = None;
            state.token = None;
        }

        if let Err(e) = self.token_store.clear().await {
            error!(error = %e, "Failed to remove stored token");
        }
        info!("Logged out");
    }

    /// Verifies the held token with the backend.
    ///
    /// # Returns
    ///
    /// - `false` immediately when no token is held
    /// - `false` after a full [`logout`](Self::logout) when verification fails
    ///   for any reason
    /// - `true` after replacing the user with the verified one
    pub async fn check_auth(&self) -> bool {
        let Some(token) = self.token().await else {
            return false;
        };

        match self.api.verify(&token).await {
            Ok(user) => {
                debug!(user_id = user.id, "Token verified");
                self.state.write().await.user = Some(user);
                true
            }
            Err(e) => {
                warn!(error = %e, "Token verification failed; logging out");
                self.logout().await;
                false
            }
        }
    }

    /// Creates an account on the backend. Auth state is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the backend error, e.g. `Http { status: 400, .. }` when the
    /// username is taken.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let account = NewAccount {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let user = self.api.register(&account).await.map_err(|e| {
            warn!(username, error = %e, "Registration failed");
            e
        })?;
        info!(user_id = user.id, username, "Registered account");
        Ok(user)
    }
}

fn failure_message(err: &ChatlineError) -> String {
    match err {
        ChatlineError::Http { message, .. } if !message.trim().is_empty() => message.clone(),
        _ => LOGIN_FAILED_MESSAGE.to_string(),
    }
}
