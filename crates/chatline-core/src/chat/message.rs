//! Conversation message types.
//!
//! This module contains types for representing messages in a chat session,
//! including roles and attached images.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Represents who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message typed by the user.
    User,
    /// Reply produced by the bot.
    Bot,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Bot => "bot",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local image picked by the user that has not been uploaded yet.
///
/// Only lives in memory. It is never serialized, so sessions reloaded from
/// the backend carry the uploaded URL instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    path: PathBuf,
}

impl LocalImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A single message in a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: String,
    /// Text content. Mutated in place while a bot reply streams.
    pub content: String,
    /// Author of the message.
    pub role: MessageRole,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// URL of an uploaded image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Image picked locally and not yet uploaded.
    #[serde(skip)]
    pub image_file: Option<LocalImage>,
}

impl Message {
    /// Creates a message with a fresh identifier and the current timestamp.
    pub fn new(
        content: impl Into<String>,
        role: MessageRole,
        image_url: Option<String>,
        image_file: Option<LocalImage>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
            image_url,
            image_file,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.role == MessageRole::Bot
    }
}
