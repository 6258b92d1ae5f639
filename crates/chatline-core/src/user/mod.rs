//! User domain module.
//!
//! # Usage
//!
//! ```ignore
//! use chatline_core::user::User;
//! ```

mod model;

// Re-export public API
pub use model::User;
