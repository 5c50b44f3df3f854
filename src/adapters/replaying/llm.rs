//! Replaying adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::cassette::replayer::CassetteReplayer;
use crate::error::{Error, Result};
use crate::ports::llm::{
    ChunkStream, CompletionFuture, CompletionRequest, CompletionResponse, LlmClient,
};

/// Serves recorded completions for one port (`llm` or `research`).
///
/// Outputs are `{"ok": {"text": ..}}`, `{"ok": {"chunks": [..]}}` or
/// `{"err": "message"}`; recorded errors come back as transport errors.
pub struct ReplayingLlmClient {
    port: &'static str,
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingLlmClient {
    /// Creates a client replaying `port` from a shared replayer.
    #[must_use]
    pub fn new(port: &'static str, replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { port, replayer }
    }

    fn next_output(&self, method: &str) -> Result<Value> {
        let mut replayer = self
            .replayer
            .lock()
            .map_err(|e| Error::Transport(format!("replayer lock poisoned: {e}")))?;
        replayer
            .next_interaction(self.port, method)
            .map(|interaction| interaction.output.clone())
            .map_err(Error::Transport)
    }
}

/// Splits a recorded output into its ok payload or recorded error.
fn ok_payload(output: Value) -> Result<Value> {
    if let Some(err) = output.get("err") {
        let msg = err.as_str().map_or_else(|| err.to_string(), str::to_string);
        return Err(Error::Transport(msg));
    }
    match output {
        Value::Object(mut map) if map.contains_key("ok") => {
            Ok(map.remove("ok").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

/// Recorded fragments, whichever shape they were stored in.
fn fragments(payload: &Value) -> Vec<String> {
    if let Some(chunks) = payload.get("chunks").and_then(Value::as_array) {
        return chunks.iter().filter_map(Value::as_str).map(str::to_string).collect();
    }
    payload.get("text").and_then(Value::as_str).map(|t| vec![t.to_string()]).unwrap_or_default()
}

fn token_count(payload: &Value, key: &str) -> u32 {
    payload.get(key).and_then(Value::as_u64).and_then(|n| u32::try_from(n).ok()).unwrap_or(0)
}

impl LlmClient for ReplayingLlmClient {
    fn complete(&self, _request: &CompletionRequest) -> CompletionFuture<'_> {
        let result = self.next_output("complete").and_then(ok_payload).map(|payload| {
            CompletionResponse {
                text: fragments(&payload).concat(),
                prompt_tokens: token_count(&payload, "prompt_tokens"),
                completion_tokens: token_count(&payload, "completion_tokens"),
            }
        });
        Box::pin(async move { result })
    }

    fn stream(&self, _request: &CompletionRequest) -> ChunkStream<'_> {
        let items: Vec<Result<String>> =
            match self.next_output("stream").and_then(ok_payload) {
                Ok(payload) => fragments(&payload).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
        Box::pin(futures::stream::iter(items))
    }
}
