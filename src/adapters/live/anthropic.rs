//! Live adapter for the `LlmClient` port using the Anthropic messages API.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::api_key;
use crate::error::{Error, Result};
use crate::ports::llm::{
    ChunkStream, CompletionFuture, CompletionRequest, CompletionResponse, LlmClient,
};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROVIDER: &str = "Anthropic";
const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Primary LLM client that calls the Anthropic Claude API.
///
/// The API key is read from `ANTHROPIC_API_KEY` on every request, so a missing
/// key surfaces on first use rather than at startup.
pub struct AnthropicClient {
    client: Client,
}

impl AnthropicClient {
    /// Creates a new Anthropic client.
    #[must_use]
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    async fn send(&self, request: &CompletionRequest, stream: bool) -> Result<reqwest::Response> {
        let api_key = api_key(PROVIDER, API_KEY_VAR)?;
        let body = AnthropicRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.as_deref(),
            messages: vec![AnthropicMessage { role: "user", content: &request.prompt }],
            stream,
        };

        debug!(model = %request.model, stream, "sending Anthropic request");
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let response_text = response.text().await.unwrap_or_default();
        let msg = serde_json::from_str::<AnthropicError>(&response_text)
            .map(|e| format!("{}: {}", e.error.kind, e.error.message))
            .unwrap_or(response_text);
        Err(Error::Transport(format!("Anthropic API error ({}): {msg}", status.as_u16())))
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Request body sent to the Anthropic messages API.
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
    stream: bool,
}

/// A single message in the Anthropic API request.
#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Top-level response from the Anthropic messages API.
#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

/// A content block in the Anthropic response.
#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Token usage reported by the Anthropic API.
#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Error response from the Anthropic API.
#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

/// Detail inside an Anthropic error response.
#[derive(Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type", default)]
    kind: String,
    message: String,
}

impl LlmClient for AnthropicClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let response = self.send(&request, false).await?;
            let response_text = response.text().await.map_err(|e| {
                Error::Transport(format!("Failed to read Anthropic API response: {e}"))
            })?;
            let api_response: AnthropicResponse = serde_json::from_str(&response_text)
                .map_err(|e| {
                    Error::Transport(format!("Failed to parse Anthropic API response: {e}"))
                })?;

            let text = api_response.content.into_iter().map(|block| block.text).collect::<String>();

            Ok(CompletionResponse {
                text,
                prompt_tokens: api_response.usage.input_tokens,
                completion_tokens: api_response.usage.output_tokens,
            })
        })
    }

    fn stream(&self, request: &CompletionRequest) -> ChunkStream<'_> {
        let request = request.clone();
        let opened = async move { self.send(&request, true).await };

        Box::pin(futures::stream::once(opened).flat_map(|opened| {
            let fragments: ChunkStream<'static> = match opened {
                Ok(response) => sse_text_fragments(response.bytes_stream()),
                Err(e) => Box::pin(futures::stream::once(async move { Err(e) })),
            };
            fragments
        }))
    }
}

type ByteStream<B> = Pin<Box<dyn Stream<Item = reqwest::Result<B>> + Send>>;

/// Buffers raw SSE bytes and hands out decoded text fragments.
struct SseState<B> {
    bytes: ByteStream<B>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

impl<B> SseState<B> {
    /// Appends raw bytes, dropping carriage returns so `\r\n` framing reads as `\n`.
    fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));
    }

    /// Moves every complete (blank-line terminated) event from the buffer into `pending`.
    ///
    /// Only complete events are decoded, so a multi-byte character split across
    /// network chunks stays intact.
    fn drain_events(&mut self) {
        while let Some(pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let raw: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            let event = String::from_utf8_lossy(&raw[..pos]);
            match parse_sse_event(&event) {
                Some(Err(e)) => {
                    self.pending.push_back(Err(e));
                    self.finished = true;
                    self.buffer.clear();
                    return;
                }
                Some(Ok(text)) => self.pending.push_back(Ok(text)),
                None => {}
            }
        }
    }
}

fn sse_text_fragments<S, B>(bytes: S) -> ChunkStream<'static>
where
    S: Stream<Item = reqwest::Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = SseState {
        bytes: Box::pin(bytes),
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    state.extend(chunk.as_ref());
                    state.drain_events();
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(Error::from(e)));
                    state.finished = true;
                }
                None => {
                    state.extend(b"\n\n");
                    state.drain_events();
                    state.finished = true;
                }
            }
        }
    }))
}

/// Decodes one SSE event block.
///
/// Returns the text of a `text_delta`, an error for `error` events, and `None`
/// for everything else (pings, message start/stop, empty blocks).
fn parse_sse_event(event: &str) -> Option<Result<String>> {
    let data: String = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n");
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    let value: serde_json::Value = serde_json::from_str(&data).ok()?;
    match value.get("type").and_then(serde_json::Value::as_str) {
        Some("content_block_delta") => {
            let delta = value.get("delta")?;
            if delta.get("type").and_then(serde_json::Value::as_str) != Some("text_delta") {
                return None;
            }
            delta.get("text").and_then(serde_json::Value::as_str).map(|t| Ok(t.to_string()))
        }
        Some("error") => {
            let error = value.get("error");
            let kind = error
                .and_then(|e| e.get("type"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("error");
            let message = error
                .and_then(|e| e.get("message"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown streaming error");
            Some(Err(Error::Transport(format!("{kind}: {message}"))))
        }
        _ => None,
    }
}
