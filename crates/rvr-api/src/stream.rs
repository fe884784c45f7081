//! Async stream that converts NDJSON lines into typed chat chunks.

use crate::ndjson::NdjsonParser;
use futures_core::Stream;
use pin_project_lite::pin_project;
use rvr_types::{ApiError, ChatChunk};
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

type ByteStream = Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>;

pin_project! {
    /// An async stream of [`ChatChunk`]s from Ollama's `/api/chat`.
    ///
    /// Every chunk in a network frame is yielded, in order, before the next
    /// frame is polled.
    pub struct ChatStream {
        #[pin]
        inner: ByteStream,
        parser: NdjsonParser,
        pending: VecDeque<Result<ChatChunk, ApiError>>,
        finished: bool,
    }
}

impl ChatStream {
    /// Create a new ChatStream from a reqwest byte stream.
    pub fn new(
        byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            parser: NdjsonParser::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

impl Stream for ChatStream {
    type Item = Result<ChatChunk, ApiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(item) = this.pending.pop_front() {
                return Poll::Ready(Some(item));
            }
            if *this.finished {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    for line in this.parser.feed(&bytes) {
                        this.pending.push_back(parse_chunk(&line));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(ApiError::Network(e.to_string()))));
                }
                Poll::Ready(None) => {
                    *this.finished = true;
                    if let Some(line) = this.parser.finish() {
                        this.pending.push_back(parse_chunk(&line));
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Decode one NDJSON line. A chunk carrying `error` becomes an error.
pub(crate) fn parse_chunk(line: &str) -> Result<ChatChunk, ApiError> {
    let chunk: ChatChunk =
        serde_json::from_str(line).map_err(|e| ApiError::StreamParse(format!("{e}: {line}")))?;
    match chunk.error {
        Some(message) => Err(ApiError::Stream(message)),
        None => Ok(chunk),
    }
}
