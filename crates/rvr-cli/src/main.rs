//! RVR Chat: talk to a Sphero RVR through a local Ollama model.

mod app;
mod commands;
mod history;
mod style;
mod system_prompt;

use anyhow::Result;
use app::{App, Flow};
use clap::Parser;
use commands::parse_command;
use history::PromptHistory;
use rvr_config::{CliOverrides, RvrConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "rvr-chat", version, about = "Chat with a Sphero RVR robot")]
struct Cli {
    /// Ollama model to use
    #[arg(long)]
    model: Option<String>,

    /// Configuration directory (default: ~/.rvr-chat)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Don't connect to the robot on startup
    #[arg(long)]
    no_connect: bool,

    /// Send a single prompt and print the response (non-interactive)
    #[arg(short, long)]
    print: Option<String>,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = RvrConfig::load(CliOverrides {
        model: cli.model,
        config_dir: cli.config_dir,
        no_connect: cli.no_connect,
    })?;
    let prompt_history_path = config.prompt_history_path();

    let mut app = App::start(config).await?;

    let result = match cli.print {
        Some(prompt) => {
            app.process_message(&prompt).await;
            Ok(())
        }
        None => repl(&mut app, PromptHistory::open(prompt_history_path)).await,
    };

    app.shutdown().await;
    result
}

/// Read lines until EOF, Ctrl+C or `/quit`.
async fn repl(app: &mut App, mut history: PromptHistory) -> Result<()> {
    tracing::debug!("{} prompt history entries", history.entries().len());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", style::user_prompt());
        io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if let Err(e) = history.add(input) {
            tracing::warn!("failed to write prompt history: {e}");
        }

        match parse_command(input) {
            Some(command) => {
                if let Flow::Quit = app.handle_command(command).await {
                    break;
                }
            }
            None => app.process_message(input).await,
        }
    }
    Ok(())
}
