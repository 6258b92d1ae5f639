//! Authentication state types.

use crate::user::User;
use serde::Serialize;

/// Fallback failure message when the backend gives no usable detail.
pub const LOGIN_FAILED_MESSAGE: &str = "登录失败";

/// The current authentication session.
///
/// A token means authenticated. The user is filled in by login or verify
/// and may lag behind the token right after a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    Failure { message: String },
}

impl LoginOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Failure message, if the login failed.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failure { message } => Some(message),
        }
    }
}

/// Credentials issued by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    pub access_token: String,
    pub user: User,
}

/// Fields needed to register a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}
