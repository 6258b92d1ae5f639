//! Chat session domain model.
//!
//! This module contains the core ChatSession entity and the title rule
//! applied when the first user message arrives.

use super::message::{Message, MessageRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to sessions before any user message was sent.
pub const DEFAULT_SESSION_TITLE: &str = "新对话";

/// Number of characters kept when a title is derived from a message.
pub const TITLE_MAX_CHARS: usize = 20;

const TITLE_ELLIPSIS: &str = "...";

/// Derives a session title from the first user message.
///
/// Keeps the first [`TITLE_MAX_CHARS`] characters and appends `"..."` only
/// when something was cut off.
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}{}", head, TITLE_ELLIPSIS)
    } else {
        head
    }
}

/// A titled, ordered collection of messages exchanged with the bot.
///
/// `id` stays empty until the backend assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Backend identifier; empty while the session is unsaved
    pub id: String,
    /// Human-readable session title
    pub title: String,
    /// Messages in send order
    pub messages: Vec<Message>,
    /// Timestamp when the session was created
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last appended message
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Creates an unsaved session with the default title.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the backend has assigned an identifier yet.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_SESSION_TITLE
    }

    /// Appends a message, refreshes `updated_at` and applies the title rule.
    pub fn push_message(&mut self, message: Message) {
        if message.role == MessageRole::User && self.has_default_title() {
            self.title = derive_title(&message.content);
        }
        self.touch(message.timestamp);
        self.messages.push(message);
    }

    /// The last message, if it is a bot message.
    pub fn last_bot_message_mut(&mut self) -> Option<&mut Message> {
        self.messages.last_mut().filter(|message| message.is_bot())
    }

    // updated_at never moves backwards
    fn touch(&mut self, at: DateTime<Utc>) {
        let now = Utc::now().max(at);
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_derive_title_long_message() {
        let content = "abcdefghijklmnopqrstuvwxyz";
        assert_eq!(derive_title(content), "abcdefghijklmnopqrst...");
    }

    #[test]
    fn test_derive_title_exactly_twenty_chars() {
        let content = "abcdefghijklmnopqrst";
        assert_eq!(derive_title(content), content);
    }

    #[test]
    fn test_derive_title_short_message() {
        assert_eq!(derive_title("hello"), "hello");
        assert_eq!(derive_title(""), "");
    }

    #[test]
    fn test_derive_title_counts_characters_not_bytes() {
        let content = "这是一个非常长的问题需要被截断因为它超过了二十个字符";
        let title = derive_title(content);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + TITLE_ELLIPSIS.len());
        assert!(title.starts_with("这是一个非常长的问题需要被截断因为它超"));
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_new_session_is_unsaved_with_default_title() {
        let session = ChatSession::new();
        assert!(!session.is_persisted());
        assert!(session.has_default_title());
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_first_user_message_sets_title() {
        let mut session = ChatSession::new();
        session.push_message(Message::new(
            "What is the weather like today in Hangzhou?",
            MessageRole::User,
            None,
            None,
        ));
        assert_eq!(session.title, "What is the weather ...");
    }

    #[test]
    fn test_bot_message_does_not_set_title() {
        let mut session = ChatSession::new();
        session.push_message(Message::new("Hi there", MessageRole::Bot, None, None));
        assert!(session.has_default_title());
    }

    #[test]
    fn test_title_set_only_once() {
        let mut session = ChatSession::new();
        session.push_message(Message::new("first", MessageRole::User, None, None));
        session.push_message(Message::new("second", MessageRole::User, None, None));
        assert_eq!(session.title, "first");
    }

    #[test]
    fn test_updated_at_refreshed_on_append() {
        let mut session = ChatSession::new();
        session.updated_at = session.updated_at - Duration::hours(1);
        let before = session.updated_at;
        session.push_message(Message::new("hi", MessageRole::User, None, None));
        assert!(session.updated_at > before);
    }

    #[test]
    fn test_updated_at_never_moves_backwards() {
        let mut session = ChatSession::new();
        let future = Utc::now() + Duration::hours(1);
        session.updated_at = future;
        session.push_message(Message::new("hi", MessageRole::User, None, None));
        assert_eq!(session.updated_at, future);
    }

    #[test]
    fn test_last_bot_message_mut_requires_bot_role() {
        let mut session = ChatSession::new();
        assert!(session.last_bot_message_mut().is_none());

        session.push_message(Message::new("question", MessageRole::User, None, None));
        assert!(session.last_bot_message_mut().is_none());

        session.push_message(Message::new("", MessageRole::Bot, None, None));
        assert!(session.last_bot_message_mut().is_some());
    }
}
