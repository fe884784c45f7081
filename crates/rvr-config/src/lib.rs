//! Layered TOML configuration for RVR Chat.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

use rvr_mcp::McpServerConfig;
use rvr_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The default chat model.
pub const DEFAULT_MODEL: &str = "qwen2.5:7b";

/// The default Ollama server URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const DEFAULT_TEMPERATURE: f64 = 0.7;

pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Name of the config file inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Resolved configuration for a chat session.
#[derive(Debug, Clone)]
pub struct RvrConfig {
    pub model: String,
    pub temperature: f64,
    pub max_history: usize,
    pub auto_connect_rvr: bool,
    pub ollama_url: String,
    pub mcp: McpServerConfig,
    pub config_dir: PathBuf,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

fn default_true() -> bool {
    true
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

/// Settings as stored in `config.toml`. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_true")]
    pub auto_connect_rvr: bool,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    /// Older single-list form of the server command (`["python", "-m", "..."]`).
    /// Overrides `mcp.command`/`mcp.args` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_command: Option<Vec<String>>,
    #[serde(default)]
    pub mcp: McpServerConfig,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_history: default_max_history(),
            auto_connect_rvr: true,
            ollama_url: default_ollama_url(),
            mcp_command: None,
            mcp: McpServerConfig::default(),
        }
    }
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub config_dir: Option<PathBuf>,
    /// Skip the automatic `connect` call at startup.
    pub no_connect: bool,
}

impl RvrConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables (`RVR_CHAT_MODEL`, `OLLAMA_HOST`)
    /// 3. Config file (`~/.rvr-chat/config.toml`)
    /// 4. Defaults
    ///
    /// The config directory is created if needed, and a config file with the
    /// defaults is written when none exists yet.
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let dir = overrides.config_dir.clone().unwrap_or_else(config_dir);
        Self::load_from(dir, overrides, |key| std::env::var(key).ok())
    }

    /// Load with an explicit directory and environment lookup.
    pub fn load_from(
        config_dir: PathBuf,
        overrides: CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Write {
            path: config_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let settings = load_or_create_settings(&config_dir.join(CONFIG_FILE))?;

        let model = overrides
            .model
            .or_else(|| env("RVR_CHAT_MODEL"))
            .unwrap_or(settings.model);

        let ollama_url = env("OLLAMA_HOST")
            .map(|host| normalize_host(&host))
            .unwrap_or(settings.ollama_url);

        let mut mcp = settings.mcp;
        if let Some(argv) = settings.mcp_command {
            let from_list = McpServerConfig::from_argv(&argv).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: "mcp_command".into(),
                    message: "must name a program".into(),
                }
            })?;
            mcp.command = from_list.command;
            mcp.args = from_list.args;
        }

        let config = RvrConfig {
            model,
            temperature: settings.temperature,
            max_history: settings.max_history,
            auto_connect_rvr: settings.auto_connect_rvr && !overrides.no_connect,
            ollama_url,
            mcp,
            config_dir,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mcp.command.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "mcp.command".into(),
                message: "must not be empty".into(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "model".into(),
                message: "must not be empty".into(),
            });
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "temperature".into(),
                message: format!("{} is not a valid temperature", self.temperature),
            });
        }
        if self.max_history == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_history".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Directory holding saved conversations.
    pub fn history_dir(&self) -> PathBuf {
        self.config_dir.join("history")
    }

    /// File holding the REPL input history.
    pub fn prompt_history_path(&self) -> PathBuf {
        self.config_dir.join("prompt_history")
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}

/// Get the config directory path (~/.rvr-chat/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RVR_CHAT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rvr-chat")
}

/// `OLLAMA_HOST` is often given without a scheme (`127.0.0.1:11434`).
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// Read and parse the settings file, writing the defaults if it is missing.
fn load_or_create_settings(path: &Path) -> Result<SettingsFile, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let settings = SettingsFile::default();
            write_settings(path, &settings)?;
            tracing::info!("wrote default config to {}", path.display());
            Ok(settings)
        }
        Err(e) => Err(ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}

fn write_settings(path: &Path, settings: &SettingsFile) -> Result<(), ConfigError> {
    let write_err = |message: String| ConfigError::Write {
        path: path.display().to_string(),
        message,
    };
    let content = toml::to_string_pretty(settings).map_err(|e| write_err(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| write_err(e.to_string()))
}
