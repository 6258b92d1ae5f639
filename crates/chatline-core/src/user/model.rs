//! User domain model.
//!
//! Represents the account the backend authenticated the client as.

use serde::{Deserialize, Serialize};

/// User domain model.
///
/// Replaced wholesale on login and token verification, cleared on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend-assigned numeric identifier
    pub id: i64,
    /// Login name
    pub username: String,
    /// Contact address
    pub email: String,
}

impl User {
    /// Fabricates the development user used by mock logins.
    pub fn mock(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            id: 1,
            email: format!("{}@example.com", username),
            username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_user() {
        let user = User::mock("alice");
        assert_eq!(user.id, 1);
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
    }
}
