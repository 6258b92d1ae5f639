//! Streamed bot reply types.

use crate::error::Result;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Events emitted while the backend streams a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    /// The backend created (or confirmed) the session the reply belongs to.
    SessionAssigned(String),
    /// A partial piece of bot text to append.
    Chunk(String),
    /// The backend gave up; the text replaces the bot message.
    Error(String),
    /// The reply is complete.
    Done { message_id: Option<String> },
}

/// Body of a streamed reply request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

pub type ReplyStream = BoxStream<'static, Result<ReplyEvent>>;

/// What a completed [`send_message`](super::ChatService::send_message) produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplySummary {
    /// Session id assigned by the backend during the stream, if any
    pub session_id: Option<String>,
    /// Final bot message content
    pub content: String,
    /// Backend id of the stored bot message
    pub message_id: Option<String>,
    /// Whether the backend reported an error event
    pub failed: bool,
}

/// An image stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// URL to reference from messages
    pub url: String,
    /// Server-side storage path, when reported
    pub path: Option<String>,
}
