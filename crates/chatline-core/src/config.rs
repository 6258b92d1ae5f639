use serde::{Deserialize, Serialize};

use crate::error::{ChatlineError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Client configuration stored in `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend origin; endpoint paths such as `/api/auth/login` are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout. `None` leaves requests unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(ChatlineError::config("base_url is required"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ChatlineError::config(format!(
                "base_url must start with http:// or https://, got '{}'",
                base
            )));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ChatlineError::config(
                "request_timeout_secs must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_base_url() {
        let config = ClientConfig {
            base_url: "  ".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let config = ClientConfig {
            base_url: "ftp://example.com".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = ClientConfig {
            request_timeout_secs: Some(0),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_normalized_base_url_strips_slash() {
        let config = ClientConfig {
            base_url: "https://chat.example.com/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(config.normalized_base_url(), "https://chat.example.com");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str("request_timeout_secs = 15").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.request_timeout_secs, Some(15));
    }
}
