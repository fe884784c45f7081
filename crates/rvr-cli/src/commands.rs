//! Slash-command parsing for the REPL.

/// A recognized `/` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Quit,
    Save(Option<String>),
    Load(Option<String>),
    List,
    Delete(Option<String>),
    Clear,
    Status,
    Connect,
    Disconnect,
    Tools,
    Model(Option<String>),
}

/// Parse a line of input as a slash command.
///
/// Returns `None` for ordinary text and for unknown commands; both are sent
/// to the model as-is.
pub fn parse_command(input: &str) -> Option<SlashCommand> {
    let rest = input.trim().strip_prefix('/')?;
    let (cmd, args) = match rest.split_once(char::is_whitespace) {
        Some((cmd, args)) => (cmd, Some(args.trim()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };
    let args = args.map(str::to_string);

    let command = match cmd.to_lowercase().as_str() {
        "help" => SlashCommand::Help,
        "quit" | "exit" | "q" => SlashCommand::Quit,
        "save" => SlashCommand::Save(args),
        "load" => SlashCommand::Load(args),
        "list" => SlashCommand::List,
        "delete" => SlashCommand::Delete(args),
        "clear" => SlashCommand::Clear,
        "status" => SlashCommand::Status,
        "connect" => SlashCommand::Connect,
        "disconnect" => SlashCommand::Disconnect,
        "tools" => SlashCommand::Tools,
        "model" => SlashCommand::Model(args),
        _ => return None,
    };
    Some(command)
}

pub const HELP: &str = "\
Commands:
  /help              - Show this help
  /quit, /exit, /q   - Exit the chat
  /save [name]       - Save conversation
  /load <name>       - Load conversation
  /list              - List saved conversations
  /delete <name>     - Delete saved conversation
  /clear             - Clear conversation history
  /status            - Show RVR status
  /connect           - Connect to RVR
  /disconnect        - Disconnect from RVR
  /tools             - List available tools
  /model [name]      - Show or change model";
