//! Named conversation files backed by JSON.

use crate::error::SessionError;
use crate::memory::ConversationMemory;
use crate::types::{SavedConversation, SavedSummary};
use std::path::PathBuf;

/// File-based history store. Each conversation is `<name>.json` in
/// `history_dir`.
pub struct HistoryStore {
    history_dir: PathBuf,
}

impl HistoryStore {
    /// Create a new store, ensuring the history directory exists.
    pub async fn new(history_dir: PathBuf) -> Result<Self, SessionError> {
        tokio::fs::create_dir_all(&history_dir).await?;
        Ok(Self { history_dir })
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.history_dir
    }

    /// Save a conversation (atomic write: .tmp → rename) and return its path.
    ///
    /// With no `name`, the memory's current session name is reused, or a
    /// local timestamp (`YYYYMMDD_HHMMSS`) is chosen. The memory remembers the
    /// name it was saved under.
    pub async fn save(
        &self,
        memory: &mut ConversationMemory,
        name: Option<&str>,
    ) -> Result<PathBuf, SessionError> {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => memory
                .session_name()
                .map(str::to_string)
                .unwrap_or_else(default_name),
        };
        let path = self.path_for(&name)?;

        let saved = memory.to_saved(&name);
        let json = serde_json::to_string_pretty(&saved)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        memory.set_session_name(name);
        tracing::debug!("saved conversation to {}", path.display());
        Ok(path)
    }

    /// Load a conversation by name.
    pub async fn load(&self, name: &str) -> Result<SavedConversation, SessionError> {
        let path = self.path_for(name)?;
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&data)?)
    }

    /// List saved conversations, newest name first. Unreadable files are
    /// skipped.
    pub async fn list(&self) -> Result<Vec<SavedSummary>, SessionError> {
        let mut summaries = Vec::new();

        let mut entries = tokio::fs::read_dir(&self.history_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let Some(stem) = file_name.strip_suffix(".json") else {
                continue;
            };

            let data = match tokio::fs::read_to_string(entry.path()).await {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Failed to read conversation {file_name}: {e}");
                    continue;
                }
            };
            match serde_json::from_str::<SavedConversation>(&data) {
                Ok(saved) => summaries.push(SavedSummary {
                    name: stem.to_string(),
                    created: saved.metadata.created,
                    message_count: saved.messages.len(),
                }),
                Err(e) => tracing::warn!("Failed to parse conversation {file_name}: {e}"),
            }
        }

        summaries.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(summaries)
    }

    /// Delete a saved conversation.
    pub async fn delete(&self, name: &str) -> Result<(), SessionError> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SessionError::NotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, SessionError> {
        validate_name(name)?;
        Ok(self.history_dir.join(format!("{name}.json")))
    }
}

/// Default conversation name: local time as `YYYYMMDD_HHMMSS`.
pub fn default_name() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Names become file stems, so they must stay inside the history directory.
fn validate_name(name: &str) -> Result<(), SessionError> {
    let invalid = name.is_empty()
        || name.contains(['/', '\\'])
        || name.contains("..")
        || name.starts_with('.')
        || name.chars().any(char::is_control);
    if invalid {
        return Err(SessionError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}
