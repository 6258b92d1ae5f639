pub mod config_service;
pub mod dto;
pub mod http_backend;
pub mod paths;
pub mod sse;
pub mod token_store;

pub use crate::config_service::ConfigService;
pub use crate::http_backend::HttpBackend;
pub use crate::paths::ChatlinePaths;
pub use crate::token_store::FileTokenStore;
