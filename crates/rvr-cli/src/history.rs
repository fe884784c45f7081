//! Prompt history persisted to `<config_dir>/prompt_history`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

const MAX_ENTRIES: usize = 1000;

/// Lines the user typed, one per line in the history file.
#[derive(Debug)]
pub struct PromptHistory {
    entries: Vec<String>,
    path: PathBuf,
}

impl PromptHistory {
    /// Open the history file. A missing or unreadable file starts empty.
    pub fn open(path: PathBuf) -> Self {
        let mut entries: Vec<String> = fs::read_to_string(&path)
            .map(|contents| {
                contents
                    .lines()
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        if entries.len() > MAX_ENTRIES {
            let excess = entries.len() - MAX_ENTRIES;
            entries.drain(..excess);
        }
        Self { entries, path }
    }

    /// Record a line and append it to the file. Skips empty lines and
    /// consecutive duplicates.
    pub fn add(&mut self, line: &str) -> io::Result<()> {
        let trimmed = line.trim();
        if trimmed.is_empty() || self.entries.last().map(String::as_str) == Some(trimmed) {
            return Ok(());
        }
        self.entries.push(trimmed.to_string());
        if self.entries.len() > MAX_ENTRIES {
            self.entries.remove(0);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{trimmed}")
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn add_appends_to_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prompt_history");
        let mut history = PromptHistory::open(path.clone());
        history.add("drive forward").unwrap();
        history.add("check battery").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "drive forward\ncheck battery\n");
    }

    #[test]
    fn skips_empty_and_consecutive_duplicates() {
        let tmp = TempDir::new().unwrap();
        let mut history = PromptHistory::open(tmp.path().join("h"));
        history.add("  ").unwrap();
        history.add("stop").unwrap();
        history.add("stop").unwrap();
        history.add("go").unwrap();
        history.add("stop").unwrap();
        assert_eq!(history.entries(), ["stop", "go", "stop"]);
    }

    #[test]
    fn reopen_loads_previous_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("h");
        PromptHistory::open(path.clone()).add("hello").unwrap();

        let history = PromptHistory::open(path);
        assert_eq!(history.entries(), ["hello"]);
    }

    #[test]
    fn missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let history = PromptHistory::open(tmp.path().join("nope"));
        assert!(history.entries().is_empty());
    }
}
