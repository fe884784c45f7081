//! Newline framing of a server's stdout.
//!
//! The server interleaves protocol traffic with whatever else it prints
//! (startup banners, log lines). Only lines that start with `{` and decode as
//! JSON are surfaced; everything else is dropped.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Reads decoded JSON values from a line-oriented byte stream.
///
/// `next_value` is cancel-safe: if the future is dropped mid-line (for example
/// by a timeout), the bytes read so far stay buffered and the next call
/// continues the same line.
pub struct LineFramer<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineFramer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Read lines until one decodes as a JSON value.
    ///
    /// Returns `Ok(None)` at end of stream.
    pub async fn next_value(&mut self) -> std::io::Result<Option<Value>> {
        loop {
            let n = self.reader.read_until(b'\n', &mut self.buf).await?;
            if n == 0 && self.buf.is_empty() {
                return Ok(None);
            }
            let line = std::mem::take(&mut self.buf);
            match decode_candidate(&String::from_utf8_lossy(&line)) {
                Some(value) => return Ok(Some(value)),
                None => {
                    tracing::trace!("skipping non-protocol line ({} bytes)", line.len());
                }
            }
        }
    }
}

/// Decode one line if it is a candidate message (non-blank, starts with `{`).
pub fn decode_candidate(line: &str) -> Option<Value> {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncWriteExt, BufReader};

    async fn collect(input: &[u8]) -> Vec<Value> {
        let mut framer = LineFramer::new(input);
        let mut values = Vec::new();
        while let Some(value) = framer.next_value().await.unwrap() {
            values.push(value);
        }
        values
    }

    #[tokio::test]
    async fn yields_only_decoded_objects_in_order() {
        let input = b"Server starting...\n\
\n\
{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n\
{not json\n\
INFO connected to /dev/ttyAMA0\n\
  {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"ok\":true}}  \n";
        let values = collect(input).await;
        assert_eq!(
            values,
            vec![
                json!({"jsonrpc": "2.0", "id": 1, "result": {}}),
                json!({"jsonrpc": "2.0", "id": 2, "result": {"ok": true}}),
            ]
        );
    }

    #[tokio::test]
    async fn non_object_json_is_skipped() {
        let values = collect(b"[1,2]\n42\n\"text\"\n{\"a\":1}\n").await;
        assert_eq!(values, vec![json!({"a": 1})]);
    }

    #[tokio::test]
    async fn final_line_without_newline() {
        let values = collect(b"banner\n{\"id\":1,\"result\":{}}").await;
        assert_eq!(values, vec![json!({"id": 1, "result": {}})]);
    }

    #[tokio::test]
    async fn crlf_line_endings() {
        let values = collect(b"hello\r\n{\"id\":1,\"result\":{}}\r\n").await;
        assert_eq!(values.len(), 1);
    }

    #[tokio::test]
    async fn empty_stream_ends_immediately() {
        assert!(collect(b"").await.is_empty());
    }

    #[tokio::test]
    async fn noise_only_stream_ends_without_values() {
        assert!(collect(b"one\ntwo\n{broken\n").await.is_empty());
    }

    #[test]
    fn decode_candidate_rules() {
        assert!(decode_candidate("").is_none());
        assert!(decode_candidate("   ").is_none());
        assert!(decode_candidate("Server starting...").is_none());
        assert!(decode_candidate("{not json").is_none());
        assert_eq!(decode_candidate(" {\"a\":1}\n"), Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn partial_line_survives_cancelled_read() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut framer = LineFramer::new(BufReader::new(reader));

        writer.write_all(b"{\"id\":1,").await.unwrap();
        let first = tokio::time::timeout(Duration::from_millis(50), framer.next_value()).await;
        assert!(first.is_err(), "read should still be waiting for the newline");

        writer.write_all(b"\"result\":{}}\n").await.unwrap();
        let value = framer.next_value().await.unwrap().unwrap();
        assert_eq!(value, json!({"id": 1, "result": {}}));
    }
}
