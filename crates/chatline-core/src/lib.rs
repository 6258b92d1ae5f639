//! Core domain of the Chatline client.
//!
//! Holds the models, the backend and storage traits, and the two services
//! that own client state: [`auth::AuthService`] and [`chat::ChatService`].
//! Transports live in `chatline-infrastructure`.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod routing;
pub mod user;

// Re-export common error type
pub use error::{ChatlineError, Result};
