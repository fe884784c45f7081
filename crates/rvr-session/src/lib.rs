//! Conversation memory and saved history for RVR Chat.

pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use error::SessionError;
pub use memory::ConversationMemory;
pub use store::HistoryStore;
pub use types::{SavedConversation, SavedSummary, SessionMetadata};
