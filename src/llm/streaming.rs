//! Streaming response handling
//!
//! The chat endpoint streams Server-Sent Events: `data: {json}` lines, each
//! carrying one delta, terminated by `data: [DONE]`.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::Stream;
use futures::StreamExt;
use serde::Deserialize;

use crate::errors::ExplorerError;
use crate::errors::Result;

/// Streaming response from LLM
pub struct StreamingResponse {
    stream: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
}

impl StreamingResponse {
    pub fn new(stream: Pin<Box<dyn Stream<Item = Result<String>> + Send>>) -> Self {
        Self { stream }
    }

    /// Wrap an already-known list of tokens
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self::new(Box::pin(futures::stream::iter(tokens.into_iter().map(Ok))))
    }

    /// Collect all chunks into a single string
    pub async fn collect_all(mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(chunk) = self.stream.next().await {
            result.push_str(&chunk?);
        }
        Ok(result)
    }

    /// Get the underlying stream
    pub fn into_stream(self) -> Pin<Box<dyn Stream<Item = Result<String>> + Send>> {
        self.stream
    }
}

/// Splits a byte stream into lines, holding back any trailing partial line
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every complete line, without its terminator
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Return whatever is left once the byte stream has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(bytes);
    line.strip_suffix('\r').unwrap_or(&line).to_string()
}

/// Meaning of one SSE line from the chat endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    Token(String),
    Done,
    Skip,
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

/// Interpret one line of the event stream
pub fn parse_sse_line(line: &str) -> Result<SseLine> {
    let Some(payload) = line.strip_prefix("data:") else {
        // blank separators, comments, event/id fields
        return Ok(SseLine::Skip);
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(SseLine::Skip);
    }
    if payload == "[DONE]" {
        return Ok(SseLine::Done);
    }

    let chunk: ChunkPayload = serde_json::from_str(payload)
        .map_err(|e| ExplorerError::LlmError(format!("Malformed stream chunk: {e}")))?;
    if let Some(error) = chunk.error {
        return Err(ExplorerError::LlmError(error.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|content| !content.is_empty())
        .map_or(SseLine::Skip, SseLine::Token))
}

struct TokenStreamState<S> {
    inner: S,
    decoder: SseLineDecoder,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

impl<S> TokenStreamState<S> {
    /// Queue the outcome of one line; returns false once the stream is over
    fn accept(&mut self, line: &str) -> bool {
        match parse_sse_line(line) {
            Ok(SseLine::Token(token)) => {
                self.pending.push_back(Ok(token));
                true
            }
            Ok(SseLine::Skip) => true,
            Ok(SseLine::Done) => false,
            Err(e) => {
                self.pending.push_back(Err(e));
                false
            }
        }
    }
}

/// Turn the raw body of a streaming chat completion into a stream of tokens
///
/// The stream ends at `[DONE]`, at the end of the body, or after the first
/// error.
pub fn token_stream<S, B, E>(body: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ExplorerError> + Send + 'static,
{
    let state = TokenStreamState {
        inner: body,
        decoder: SseLineDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.inner.next().await {
                Some(Ok(bytes)) => {
                    for line in state.decoder.push(bytes.as_ref()) {
                        if !state.accept(&line) {
                            state.finished = true;
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(e.into()));
                    state.finished = true;
                }
                None => {
                    if let Some(line) = state.decoder.finish() {
                        state.accept(&line);
                    }
                    state.finished = true;
                }
            }
        }
    })
}
