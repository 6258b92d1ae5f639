use super::route::Route;
use crate::auth::TokenStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// What to do with a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Continue to the requested path.
    Proceed,
    /// Go to this route instead.
    Redirect(Route),
}

impl NavigationDecision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// Keeps anonymous users out of protected views.
///
/// Only checks that a token is stored. Whether the token is still valid is
/// left to [`AuthService::check_auth`](crate::auth::AuthService::check_auth),
/// which the guard never calls.
pub struct RouteGuard {
    token_store: Arc<dyn TokenStore>,
}

impl RouteGuard {
    pub fn new(token_store: Arc<dyn TokenStore>) -> Self {
        Self { token_store }
    }

    /// Decides whether navigation to `path` may proceed.
    ///
    /// Unknown paths are treated as public.
    pub async fn before_each(&self, path: &str) -> NavigationDecision {
        let requires_auth = Route::from_path(path)
            .map(|route| route.requires_auth())
            .unwrap_or(false);
        if !requires_auth {
            return NavigationDecision::Proceed;
        }

        let has_token = match self.token_store.load().await {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "Failed to read token store; treating as logged out");
                false
            }
        };

        if has_token {
            NavigationDecision::Proceed
        } else {
            debug!(path, "Redirecting anonymous navigation to login");
            NavigationDecision::Redirect(Route::Login)
        }
    }
}
