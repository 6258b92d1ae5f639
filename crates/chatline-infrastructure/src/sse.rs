//! Server-sent event decoding for streamed replies.

use crate::dto::StreamFrameDto;
use chatline_core::chat::{ReplyEvent, ReplyStream};
use chatline_core::error::{ChatlineError, Result};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::VecDeque;
use tracing::{debug, warn};

const FRAME_SEPARATOR: &[u8] = b"\n\n";
const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

/// Splits a byte stream into SSE frames and extracts their `data` payloads.
///
/// Bytes are buffered until a blank line ends the frame, so frames and
/// multi-byte characters may be split across network chunks. CRLF, CR and LF
/// line endings are all accepted.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    after_cr: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns the payloads of every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.append_normalized(chunk);

        let mut payloads = Vec::new();
        while let Some(end) = find(&self.buffer, FRAME_SEPARATOR) {
            let frame: Vec<u8> = self.buffer.drain(..end + FRAME_SEPARATOR.len()).collect();
            if let Some(payload) = frame_data(&frame[..end]) {
                payloads.push(payload);
            }
        }
        payloads
    }

    // Stores every line ending as LF. A CRLF split across chunks counts once.
    fn append_normalized(&mut self, chunk: &[u8]) {
        for &byte in chunk {
            match byte {
                b'\r' => {
                    self.buffer.push(b'\n');
                    self.after_cr = true;
                }
                b'\n' if self.after_cr => self.after_cr = false,
                _ => {
                    self.buffer.push(byte);
                    self.after_cr = false;
                }
            }
        }
    }

    /// Returns the payload of a trailing frame that never got its blank line.
    pub fn finish(self) -> Option<String> {
        frame_data(&self.buffer)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// Joins the frame's data lines; comments and other fields are ignored.
fn frame_data(frame: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(frame);
    let lines: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix(DATA_PREFIX))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Parses one payload into a reply event.
///
/// Payloads that are not JSON or have an unknown shape are skipped.
pub fn parse_payload(payload: &str) -> Option<ReplyEvent> {
    let payload = payload.trim();
    if payload.is_empty() || payload == DONE_MARKER {
        return None;
    }
    match serde_json::from_str::<StreamFrameDto>(payload) {
        Ok(frame) => frame.into_event(),
        Err(e) => {
            warn!(error = %e, payload, "Skipping malformed reply frame");
            None
        }
    }
}

struct DecodeState {
    inner: BoxStream<'static, std::result::Result<Vec<u8>, String>>,
    decoder: Option<SseDecoder>,
    pending: VecDeque<Result<ReplyEvent>>,
}

/// Turns a response body into a stream of reply events.
///
/// A transport error ends the stream after yielding `ChatlineError::Network`.
pub fn reply_events<S, B, E>(body: S) -> ReplyStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let inner = body
        .map(|chunk| {
            chunk
                .map(|bytes| bytes.as_ref().to_vec())
                .map_err(|e| e.to_string())
        })
        .boxed();

    let state = DecodeState {
        inner,
        decoder: Some(SseDecoder::new()),
        pending: VecDeque::new(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((event, state));
            }
            let decoder = state.decoder.as_mut()?;

            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    let events = decoder.push(&chunk).into_iter().filter_map(|p| parse_payload(&p));
                    state.pending.extend(events.map(Ok));
                }
                Some(Err(e)) => {
                    state.decoder = None;
                    state
                        .pending
                        .push_back(Err(ChatlineError::network(format!("Reply stream broke: {}", e))));
                }
                None => {
                    debug!("Reply stream ended");
                    let trailing = state.decoder.take().and_then(SseDecoder::finish);
                    if let Some(event) = trailing.as_deref().and_then(parse_payload) {
                        state.pending.push_back(Ok(event));
                    }
                }
            }
        }
    })
    .boxed()
}
