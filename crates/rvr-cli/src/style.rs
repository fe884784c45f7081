//! Terminal style helpers using crossterm ANSI escape sequences.

use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};
use rvr_types::ellipsize;

/// Longest tool result shown inline before it is cut.
const MAX_RESULT_DISPLAY: usize = 300;

/// Wrap text in bold.
pub fn bold(text: &str) -> String {
    format!(
        "{}{}{}",
        SetAttribute(Attribute::Bold),
        text,
        SetAttribute(Attribute::Reset)
    )
}

/// Wrap text in a foreground color.
pub fn fg_color(text: &str, color: Color) -> String {
    format!(
        "{}{}{}",
        SetForegroundColor(color),
        text,
        SetForegroundColor(Color::Reset)
    )
}

/// The REPL prompt: bold green `You: `.
pub fn user_prompt() -> String {
    format!(
        "{}{}You: {}",
        SetForegroundColor(Color::Green),
        SetAttribute(Attribute::Bold),
        SetAttribute(Attribute::Reset)
    )
}

/// Label printed before streamed assistant text.
pub fn assistant_label() -> String {
    fg_color("Assistant: ", Color::Blue)
}

/// `  [Calling: name(args)]` in dim italic grey.
pub fn tool_call(name: &str, arguments: &serde_json::Value) -> String {
    tool_line(&format!("[Calling: {name}({arguments})]"))
}

/// `  [Result: ...]` in dim italic grey, cut to a readable length.
pub fn tool_result(result: &serde_json::Value) -> String {
    let text = result.to_string();
    tool_line(&format!(
        "[Result: {}]",
        ellipsize(&text, MAX_RESULT_DISPLAY)
    ))
}

fn tool_line(text: &str) -> String {
    format!(
        "  {}{}{}{}{}",
        SetForegroundColor(Color::DarkGrey),
        SetAttribute(Attribute::Italic),
        text,
        SetAttribute(Attribute::Reset),
        SetForegroundColor(Color::Reset)
    )
}

/// Bold red error text.
pub fn error(text: &str) -> String {
    format!(
        "{}{}{}{}",
        SetForegroundColor(Color::Red),
        SetAttribute(Attribute::Bold),
        text,
        SetAttribute(Attribute::Reset)
    )
}

/// A `=` rule for the startup banner.
pub fn rule() -> String {
    "=".repeat(40)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bold_wraps_text() {
        let result = bold("hello");
        assert!(result.contains("hello"));
        assert!(result.starts_with('\x1b'));
    }

    #[test]
    fn prompt_contains_label() {
        assert!(user_prompt().contains("You: "));
    }

    #[test]
    fn tool_call_shows_name_and_args() {
        let line = tool_call("drive_forward", &json!({"distance": 0.5}));
        assert!(line.contains(r#"[Calling: drive_forward({"distance":0.5})]"#));
        assert!(line.starts_with("  "));
    }

    #[test]
    fn tool_result_is_cut() {
        let long = json!({"data": "x".repeat(1000)});
        let line = tool_result(&long);
        assert!(line.contains("[Result: "));
        assert!(line.len() < 500);
    }

    #[test]
    fn tool_result_short_is_whole() {
        let line = tool_result(&json!({"battery_percentage": 87}));
        assert!(line.contains(r#"[Result: {"battery_percentage":87}]"#));
    }

    #[test]
    fn error_contains_text() {
        let result = error("boom");
        assert!(result.contains("boom"));
        assert!(result.contains('\x1b'));
    }
}
