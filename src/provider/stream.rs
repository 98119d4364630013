//! Server-Sent-Events decoding for streamed chat completions.
//!
//! The body is split into lines as bytes arrive. Each line is decoded on its
//! own; a line that fails to decode is logged and dropped, and the stream
//! carries on with the next one. `data: [DONE]` ends the stream, and so does
//! the server closing the body.

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::Deserialize;

use super::constants::sse::{DATA_PREFIX, DONE_MARKER};
use crate::core::error::BoxError;
use crate::core::{Fragment, LlmError};

/// Lazy, single-pass sequence of fragments in arrival order.
pub type FragmentStream = BoxStream<'static, Result<Fragment, LlmError>>;

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// What a single line of the event stream means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Keep-alive framing or a chunk without new content.
    Skip,
    Content(String),
    Done,
    /// Could not be decoded; the reason is for diagnostics only.
    Malformed(String),
}

/// Decodes one raw line (without its line terminator).
pub fn decode_line(raw: &[u8]) -> LineEvent {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line,
        Err(e) => return LineEvent::Malformed(format!("invalid UTF-8: {e}")),
    };
    if line.trim().is_empty() {
        return LineEvent::Skip;
    }

    let payload = line.strip_prefix(DATA_PREFIX).unwrap_or(line);
    if payload.trim() == DONE_MARKER {
        return LineEvent::Done;
    }

    let chunk: StreamChunk = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => return LineEvent::Malformed(e.to_string()),
    };

    match chunk.choices.into_iter().next() {
        None => LineEvent::Malformed("chunk has no choices".to_string()),
        Some(StreamChoice {
            delta: Delta {
                content: Some(content),
            },
        }) if !content.is_empty() => LineEvent::Content(content),
        Some(_) => LineEvent::Skip,
    }
}

/// Splits a byte stream on `\n`, tolerating `\r\n` and lines that straddle
/// chunk boundaries.
#[derive(Debug, Default)]
struct LineSplitter {
    buffer: BytesMut,
}

impl LineSplitter {
    fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    fn next_line(&mut self) -> Option<Bytes> {
        let pos = self.buffer.iter().position(|b| *b == b'\n')?;
        let mut line = self.buffer.split_to(pos + 1);
        line.truncate(pos);
        Some(trim_cr(line))
    }

    /// Whatever is left once the body has ended, if anything.
    fn finish(&mut self) -> Option<Bytes> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = self.buffer.split();
        Some(trim_cr(rest))
    }
}

fn trim_cr(mut line: BytesMut) -> Bytes {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    line.freeze()
}

struct DecodeState {
    body: BoxStream<'static, Result<Bytes, BoxError>>,
    lines: LineSplitter,
    body_done: bool,
    finished: bool,
}

impl DecodeState {
    /// Applies one line. Returns a fragment when the line carried content.
    fn apply(&mut self, line: &[u8]) -> Option<Fragment> {
        match decode_line(line) {
            LineEvent::Content(text) => Some(Fragment::new(text)),
            LineEvent::Skip => None,
            LineEvent::Done => {
                tracing::debug!("Received terminal marker");
                self.finished = true;
                None
            }
            LineEvent::Malformed(reason) => {
                tracing::warn!(error = %reason, line = %String::from_utf8_lossy(line), "Skipping malformed stream line");
                None
            }
        }
    }
}

/// Builds a [`FragmentStream`] over a raw body stream.
///
/// The body stream is owned by the returned stream and dropped with it, so the
/// connection is released however consumption ends.
pub fn fragment_stream<S, E>(body: S) -> FragmentStream
where
    S: futures::Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<BoxError>,
{
    let state = DecodeState {
        body: body.map_err(|e| -> BoxError { e.into() }).boxed(),
        lines: LineSplitter::default(),
        body_done: false,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }

            if let Some(line) = state.lines.next_line() {
                if let Some(fragment) = state.apply(&line) {
                    return Some((Ok(fragment), state));
                }
                continue;
            }

            if state.body_done {
                // Last unterminated line, then implicit end of stream.
                state.finished = true;
                let fragment = state.lines.finish().and_then(|line| state.apply(&line));
                return fragment.map(|fragment| (Ok(fragment), state));
            }

            match state.body.next().await {
                Some(Ok(chunk)) => state.lines.push(&chunk),
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(LlmError::network("Stream interrupted", e)), state));
                }
                None => {
                    tracing::debug!("Response body ended");
                    state.body_done = true;
                }
            }
        }
    })
    .boxed()
}

/// A stream holding exactly one fragment, used to surface a per-request
/// condition through the streaming interface.
pub fn single_fragment(text: impl Into<String>) -> FragmentStream {
    stream::once(futures::future::ready(Ok(Fragment::new(text)))).boxed()
}
