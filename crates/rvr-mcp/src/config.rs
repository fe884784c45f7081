//! Configuration for the MCP server process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Command used when no server command is configured.
pub const DEFAULT_SERVER_COMMAND: &str = "sphero-rvr-mcp";

fn default_command() -> String {
    DEFAULT_SERVER_COMMAND.to_string()
}

fn default_timeout() -> u64 {
    30_000
}

fn default_shutdown_grace() -> u64 {
    5_000
}

/// How to launch and talk to the MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Command to run (e.g., "sphero-rvr-mcp", "python").
    #[serde(default = "default_command")]
    pub command: String,
    /// Arguments to pass to the command.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables to set for the server process.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Timeout for requests in milliseconds (default: 30000).
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    /// How long `stop` waits after asking the server to exit before killing it.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,
    /// Forward the server's stderr to debug logs instead of discarding it.
    #[serde(default)]
    pub capture_stderr: bool,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
            env: HashMap::new(),
            timeout_ms: default_timeout(),
            shutdown_grace_ms: default_shutdown_grace(),
            capture_stderr: false,
        }
    }
}

impl McpServerConfig {
    /// Build a config from an argv-style list: program first, then its arguments.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (command, args) = argv.split_first()?;
        Some(Self {
            command: command.clone(),
            args: args.to_vec(),
            ..Self::default()
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// The full command line, for display.
    pub fn display_command(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
