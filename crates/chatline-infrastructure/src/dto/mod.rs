//! Data Transfer Objects (DTOs) for the backend wire format.
//!
//! These DTOs mirror the backend's snake_case JSON. They are private to the
//! infrastructure layer; conversions into domain types live next to each DTO
//! and are the only place wire quirks are handled:
//!
//! - message role is sent as `type`
//! - `content` and `updated_at` may be null
//! - timestamps may be naive (no offset), read as UTC

mod reply;
mod session;
mod timestamp;
mod user;

pub use reply::{StreamFrameDto, UploadResponseDto};
pub use session::{MessageDto, SessionDto};
pub use timestamp::parse_timestamp;
pub use user::{ErrorDto, LoginResponseDto, UserDto, VerifyResponseDto};
