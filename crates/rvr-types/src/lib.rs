//! Shared types and error hierarchy for RVR Chat.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
pub mod util;

pub use error::{ApiError, ChatError, ConfigError};
pub use message::*;
pub use tool::*;
pub use util::ellipsize;
