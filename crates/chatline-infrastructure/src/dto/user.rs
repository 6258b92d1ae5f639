//! Auth DTOs

use chatline_core::auth::LoginGrant;
use chatline_core::user::User;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        User {
            id: dto.id,
            username: dto.username,
            email: dto.email,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponseDto {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: UserDto,
}

impl From<LoginResponseDto> for LoginGrant {
    fn from(dto: LoginResponseDto) -> Self {
        LoginGrant {
            access_token: dto.access_token,
            user: dto.user.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponseDto {
    #[serde(default)]
    pub valid: Option<bool>,
    pub user: UserDto,
}

/// Error body. `detail` is a string for handled errors and a list of
/// validation issues for 422 responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDto {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorDto {
    /// Parses an error body, tolerating bodies that are not JSON.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// The detail, when it is a non-empty string.
    pub fn message(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(|detail| detail.as_str())
            .filter(|detail| !detail.trim().is_empty())
    }
}
