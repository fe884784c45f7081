//! Display helpers for terminal output.

/// Shorten `s` to at most `max_chars` characters, ending with `...` when cut.
///
/// Counts chars rather than bytes so multi-byte text never splits mid-codepoint.
pub fn ellipsize(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_untouched() {
        assert_eq!(ellipsize("stop", 10), "stop");
    }

    #[test]
    fn exact_length_untouched() {
        assert_eq!(ellipsize("hello", 5), "hello");
    }

    #[test]
    fn long_text_cut_with_ellipsis() {
        assert_eq!(ellipsize("drive_forward distance", 10), "drive_f...");
    }

    #[test]
    fn multibyte_text_is_not_split() {
        let s = "\u{1F916}".repeat(20);
        let out = ellipsize(&s, 8);
        assert_eq!(out.chars().count(), 8);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn tiny_limit() {
        assert_eq!(ellipsize("abcdef", 2), "...");
    }
}
