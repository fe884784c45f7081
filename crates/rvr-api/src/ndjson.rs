//! Newline-delimited JSON line splitter.
//!
//! Ollama streams one JSON object per line. HTTP frames do not line up with
//! those lines, so bytes are buffered until a newline completes a line.

/// Incremental NDJSON parser that turns byte chunks into complete lines.
#[derive(Debug, Default)]
pub struct NdjsonParser {
    buffer: Vec<u8>,
}

impl NdjsonParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return any complete, non-blank lines.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(line) = Self::clean(&line) {
                lines.push(line);
            }
        }

        lines
    }

    /// Take whatever is left once the stream has ended.
    ///
    /// The final object is not always followed by a newline.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        Self::clean(&rest)
    }

    fn clean(line: &[u8]) -> Option<String> {
        // UTF-8 is only decoded on whole lines, so multi-byte characters split
        // across chunks survive.
        let text = String::from_utf8_lossy(line);
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}
