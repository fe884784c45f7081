//! Saved conversation data types.

use chrono::{DateTime, Utc};
use rvr_types::ChatMessage;
use serde::{Deserialize, Serialize};

/// Timestamps for a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl SessionMetadata {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            updated: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }
}

/// A conversation as written to `<history_dir>/<name>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedConversation {
    pub session_name: String,
    pub metadata: SessionMetadata,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// One entry in the saved-conversation listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSummary {
    /// File stem, which is what `/load` takes.
    pub name: String,
    pub created: DateTime<Utc>,
    pub message_count: usize,
}

impl SavedSummary {
    /// Creation date as `YYYY-MM-DD`.
    pub fn created_date(&self) -> String {
        self.created.format("%Y-%m-%d").to_string()
    }
}
