//! Chat backend trait.
//!
//! Defines the interface for session persistence and reply streaming against
//! the remote backend.

use super::model::ChatSession;
use super::reply::{ReplyRequest, ReplyStream, UploadedImage};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// An abstract backend for chat sessions.
///
/// This trait decouples [`ChatService`](super::ChatService) from the HTTP
/// transport. Every call takes the bearer token explicitly; implementations
/// never read the token store themselves.
///
/// # Error mapping
///
/// Implementations should return:
/// - `ChatlineError::Network` when no response was received
/// - `ChatlineError::Http` for non-success statuses
/// - `ChatlineError::InvalidResponse` when the body cannot be decoded
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Lists the user's sessions, most recently updated first.
    async fn list_sessions(&self, token: &str) -> Result<Vec<ChatSession>>;

    /// Stores the full session on the backend.
    async fn save_session(&self, token: &str, session: &ChatSession) -> Result<()>;

    /// Deletes a session.
    ///
    /// # Returns
    ///
    /// - `Ok(status)`: The request completed, whatever the HTTP status
    /// - `Err(_)`: No response was received
    async fn delete_session(&self, token: &str, session_id: &str) -> Result<u16>;

    /// Opens a streamed reply for a user message.
    async fn stream_reply(&self, token: &str, request: ReplyRequest) -> Result<ReplyStream>;

    /// Uploads a local image file.
    async fn upload_image(&self, token: &str, path: &Path) -> Result<UploadedImage>;
}
