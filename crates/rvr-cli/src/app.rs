//! The chat application: startup checks, slash commands, turns and shutdown.

use crate::commands::{HELP, SlashCommand};
use crate::style;
use crate::system_prompt::SYSTEM_PROMPT;
use anyhow::{Context, Result};
use rvr_api::{OllamaClient, OllamaProvider, model_is_available};
use rvr_config::RvrConfig;
use rvr_core::{Agent, AgentEvent};
use rvr_mcp::{McpClient, ToolDescriptor, to_model_tools};
use rvr_session::{ConversationMemory, HistoryStore, SessionError};
use rvr_types::{ChatError, Role, Usage, tool_error_message};
use serde_json::{Value, json};
use std::io::{self, Write};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Name the MCP server is known by in logs.
const SERVER_NAME: &str = "sphero-rvr";

/// How many saved conversations `/list` shows.
const LIST_LIMIT: usize = 10;

/// Whether the REPL keeps going after a command.
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    config: RvrConfig,
    agent: Agent,
    mcp: Arc<McpClient>,
    tools: Vec<ToolDescriptor>,
    memory: ConversationMemory,
    store: HistoryStore,
    usage: Usage,
}

impl App {
    /// Check Ollama, start the robot server, load its tools and seed the
    /// conversation. Any failure here is fatal.
    pub async fn start(config: RvrConfig) -> Result<Self> {
        eprintln!("{}", style::bold(&format!("RVR Chat v{}", env!("CARGO_PKG_VERSION"))));
        eprintln!("{}", style::rule());

        let client = OllamaClient::new(&config.ollama_url)
            .context("Failed to create Ollama client")?;
        ensure_model(&client, &config.model).await?;

        eprint!("Starting MCP server ({})... ", config.mcp.display_command());
        let _ = io::stderr().flush();
        let mcp = match McpClient::start(SERVER_NAME, &config.mcp).await {
            Ok(mcp) => mcp,
            Err(e) => {
                eprintln!("FAILED");
                return Err(e).context(format!(
                    "Could not start MCP server. Check that {} is installed",
                    config.mcp.command
                ));
            }
        };
        eprintln!("OK ({} {})", mcp.server_info().name, mcp.server_info().version);
        let mcp = Arc::new(mcp);

        eprint!("Loading tools... ");
        let _ = io::stderr().flush();
        let tools = match mcp.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                eprintln!("FAILED");
                mcp.stop().await;
                return Err(e).context("Could not load tools from the MCP server");
            }
        };
        eprintln!("OK ({} tools)", tools.len());

        let provider = Arc::new(OllamaProvider::from_client(client));
        let mut agent = Agent::new(
            provider,
            mcp.clone(),
            config.model.clone(),
            config.temperature,
        );
        agent.set_tools(to_model_tools(&tools));

        let mut memory = ConversationMemory::new(config.max_history);
        memory.add_message(Role::System, SYSTEM_PROMPT, Vec::new());

        let store = match HistoryStore::new(config.history_dir()).await {
            Ok(store) => store,
            Err(e) => {
                mcp.stop().await;
                return Err(e).context("Could not create the history directory");
            }
        };

        let app = Self {
            config,
            agent,
            mcp,
            tools,
            memory,
            store,
            usage: Usage::default(),
        };

        if app.config.auto_connect_rvr {
            app.auto_connect().await;
        }

        eprintln!("{}", style::rule());
        eprintln!("Type /help for commands, /quit to exit\n");
        Ok(app)
    }

    async fn auto_connect(&self) {
        eprint!("Connecting to RVR... ");
        let _ = io::stderr().flush();
        let result = self.mcp.call_tool("connect", json!({})).await;
        if is_success(&result) {
            eprintln!("OK");
            self.print_battery().await;
        } else {
            eprintln!("FAILED ({})", tool_error_message(&result).unwrap_or("unknown"));
            eprintln!("You can connect manually with: /connect");
        }
    }

    async fn print_battery(&self) {
        let battery = self.mcp.call_tool("get_battery_status", json!({})).await;
        eprintln!("Battery: {}%", battery_text(&battery));
    }

    /// Run a slash command.
    pub async fn handle_command(&mut self, command: SlashCommand) -> Flow {
        match command {
            SlashCommand::Quit => return Flow::Quit,
            SlashCommand::Help => eprintln!("{HELP}"),
            SlashCommand::Save(name) => {
                match self.store.save(&mut self.memory, name.as_deref()).await {
                    Ok(path) => eprintln!("Saved to: {}", path.display()),
                    Err(e) => eprintln!("{}", style::error(&format!("Save failed: {e}"))),
                }
            }
            SlashCommand::Load(None) => eprintln!("Usage: /load <name>"),
            SlashCommand::Load(Some(name)) => match self.store.load(&name).await {
                Ok(saved) => {
                    self.memory.restore(saved);
                    eprintln!("Loaded conversation: {name}");
                }
                Err(SessionError::NotFound { .. }) => {
                    eprintln!("Conversation not found: {name}");
                }
                Err(e) => eprintln!("{}", style::error(&format!("Load failed: {e}"))),
            },
            SlashCommand::List => match self.store.list().await {
                Ok(saved) if saved.is_empty() => eprintln!("No saved conversations"),
                Ok(saved) => {
                    eprintln!("Saved conversations:");
                    for s in saved.iter().take(LIST_LIMIT) {
                        eprintln!(
                            "  {} ({} messages, {})",
                            s.name,
                            s.message_count,
                            s.created_date()
                        );
                    }
                }
                Err(e) => eprintln!("{}", style::error(&format!("List failed: {e}"))),
            },
            SlashCommand::Delete(None) => eprintln!("Usage: /delete <name>"),
            SlashCommand::Delete(Some(name)) => match self.store.delete(&name).await {
                Ok(()) => eprintln!("Deleted: {name}"),
                Err(SessionError::NotFound { .. }) => eprintln!("Not found: {name}"),
                Err(e) => eprintln!("{}", style::error(&format!("Delete failed: {e}"))),
            },
            SlashCommand::Clear => {
                self.memory.clear();
                eprintln!("Conversation cleared");
            }
            SlashCommand::Status => {
                let status = self
                    .mcp
                    .call_tool("get_connection_status", json!({}))
                    .await;
                let connected = status
                    .get("connected")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                eprintln!("Connected: {connected}");
                if connected {
                    self.print_battery().await;
                }
            }
            SlashCommand::Connect => {
                let result = self.mcp.call_tool("connect", json!({})).await;
                if is_success(&result) {
                    eprintln!("Connected to RVR");
                } else {
                    eprintln!(
                        "Connection failed: {}",
                        tool_error_message(&result).unwrap_or("unknown")
                    );
                }
            }
            SlashCommand::Disconnect => {
                self.mcp.call_tool("disconnect", json!({})).await;
                eprintln!("Disconnected from RVR");
            }
            SlashCommand::Tools => {
                eprintln!("Available tools ({}):", self.tools.len());
                for tool in &self.tools {
                    eprintln!("  {}", tool.name);
                }
            }
            SlashCommand::Model(None) => eprintln!("Current model: {}", self.agent.model()),
            SlashCommand::Model(Some(model)) => {
                self.agent.set_model(model.clone());
                self.config.model = model;
                eprintln!("Model set to: {}", self.agent.model());
            }
        }
        Flow::Continue
    }

    /// Send one user message through the model, streaming the reply to
    /// stdout. Ctrl+C cancels the turn.
    pub async fn process_message(&mut self, input: &str) {
        self.memory.add_message(Role::User, input, Vec::new());

        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let stdout = io::stdout();
        let mut out = stdout.lock();
        let _ = write!(out, "\n{}", style::assistant_label());
        let _ = out.flush();
        let mut needs_label = false;

        let result = self
            .agent
            .run(&mut self.memory, cancel, |event| match event {
                AgentEvent::TextDelta(text) => {
                    if needs_label {
                        let _ = write!(out, "\n{}", style::assistant_label());
                        needs_label = false;
                    }
                    let _ = write!(out, "{text}");
                    let _ = out.flush();
                }
                AgentEvent::ToolStart { name, arguments } => {
                    let _ = writeln!(out);
                    let _ = writeln!(out, "{}", style::tool_call(&name, &arguments));
                }
                AgentEvent::ToolEnd { result, .. } => {
                    let _ = writeln!(out, "{}", style::tool_result(&result));
                    needs_label = true;
                }
                AgentEvent::Done => {
                    let _ = writeln!(out);
                }
                AgentEvent::Error(e) => {
                    if needs_label {
                        let _ = write!(out, "\n{}", style::assistant_label());
                        needs_label = false;
                    }
                    let _ = writeln!(out, "{}", style::error(&e));
                }
                AgentEvent::Cancelled => {
                    let _ = writeln!(out);
                    let _ = writeln!(out, "{}", style::error("[cancelled]"));
                }
                AgentEvent::Usage(_) => {}
            })
            .await;
        watcher.abort();

        match result {
            Ok(usage) => self.usage.add(&usage),
            Err(ChatError::Cancelled) => tracing::info!("turn cancelled"),
            Err(e) => tracing::debug!("turn failed: {e}"),
        }
        let _ = writeln!(out);
    }

    /// Disconnect the robot, stop the server and report token usage.
    pub async fn shutdown(self) {
        eprintln!("\nShutting down...");
        self.mcp.call_tool("disconnect", json!({})).await;
        match self.mcp.stop().await {
            Some(outcome) => tracing::info!("MCP server stopped: {outcome:?}"),
            None => tracing::debug!("MCP server already stopped"),
        }
        print_usage(&self.usage);
    }
}

/// Make sure the configured model is installed, pulling it if not.
async fn ensure_model(client: &OllamaClient, model: &str) -> Result<()> {
    eprint!("Checking Ollama... ");
    let _ = io::stderr().flush();
    let models = match client.list_models().await {
        Ok(models) => {
            eprintln!("OK");
            models
        }
        Err(e) => {
            eprintln!("FAILED");
            return Err(e).with_context(|| {
                format!(
                    "Ollama is not reachable at {}. Make sure it is running: ollama serve",
                    client.base_url()
                )
            });
        }
    };

    if model_is_available(&models, model) {
        eprintln!("Model: {model}");
        return Ok(());
    }

    eprintln!("Model '{model}' not found. Pulling...");
    client
        .pull_model(model)
        .await
        .with_context(|| format!("Failed to pull model '{model}'"))?;
    eprintln!("Model '{model}' ready");
    Ok(())
}

fn is_success(result: &Value) -> bool {
    result
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// The battery percentage from a `get_battery_status` result, or `?`.
fn battery_text(result: &Value) -> String {
    match result.get("battery_percentage") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => "?".to_string(),
    }
}

fn print_usage(usage: &Usage) {
    eprintln!(
        "Tokens: prompt {}, completion {}",
        usage.prompt_tokens, usage.completion_tokens
    );
}
