//! Chat domain module.
//!
//! This module contains the chat session and message models, the backend
//! interface for session sync and streamed replies, and [`ChatService`], the
//! client-side owner of the session collection.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`ChatSession`) and the title rule
//! - `message`: Message types (`MessageRole`, `Message`, `LocalImage`)
//! - `reply`: Streamed reply types (`ReplyEvent`, `ReplyRequest`, `ReplySummary`)
//! - `api`: Backend trait for sessions, replies and uploads
//! - `service`: Session state management (`ChatService`)
//!
//! # Usage
//!
//! ```ignore
//! use chatline_core::chat::{ChatService, ChatApi, ChatSession};
//! use chatline_core::chat::{Message, MessageRole};
//! ```

mod api;
mod message;
mod model;
mod reply;
mod service;


// Re-export public API
pub use api::ChatApi;
pub use message::{LocalImage, Message, MessageRole};
pub use model::{ChatSession, DEFAULT_SESSION_TITLE, TITLE_MAX_CHARS, derive_title};
pub use reply::{ReplyEvent, ReplyRequest, ReplyStream, ReplySummary, UploadedImage};
pub use service::{ChatService, REPLY_FAILURE_PREFIX};
