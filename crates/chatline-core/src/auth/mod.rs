//! Authentication domain module.
//!
//! - `model`: Auth state and login result types
//! - `api`: Backend trait for login, verify and registration
//! - `token_store`: Durable storage for the bearer token
//! - `service`: Auth lifecycle management (`AuthService`)

mod api;
mod model;
mod service;
mod token_store;

pub use api::AuthApi;
pub use model::{AuthState, LOGIN_FAILED_MESSAGE, LoginGrant, LoginOutcome, NewAccount};
pub use service::AuthService;
pub use token_store::{MemoryTokenStore, TokenStore};
