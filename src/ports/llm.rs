//! LLM client port for language-model completions.

use std::future::Future;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Boxed future type alias used by [`LlmClient`] to keep the trait dyn-compatible.
pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse>> + Send + 'a>>;

/// Incrementally produced text fragments of a streaming completion.
pub type ChunkStream<'a> = Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>>;

/// A request to generate a completion from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRequest {
    /// The model identifier (e.g. `"claude-3-7-sonnet-20250219"`).
    pub model: String,
    /// Optional system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// The user prompt to send.
    pub prompt: String,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// The response from an LLM completion call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionResponse {
    /// The generated text.
    pub text: String,
    /// Number of prompt tokens consumed.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Number of completion tokens generated.
    #[serde(default)]
    pub completion_tokens: u32,
}

/// Sends completion requests to a language model.
///
/// Implementations propagate transport and provider errors untouched and never
/// interpret the generated text.
pub trait LlmClient: Send + Sync {
    /// Generates a fully materialized completion for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (network, auth, rate-limit, etc.).
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_>;

    /// Generates a completion as a stream of text fragments.
    ///
    /// Providers without native streaming yield the full completion as one fragment.
    fn stream(&self, request: &CompletionRequest) -> ChunkStream<'_> {
        let pending = self.complete(request);
        Box::pin(futures::stream::once(async move { pending.await.map(|r| r.text) }))
    }
}

/// Drains a chunk stream into one string, stopping at the first error.
///
/// # Errors
///
/// Returns the first error yielded by the stream.
pub async fn accumulate(mut stream: ChunkStream<'_>) -> Result<String> {
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        text.push_str(&chunk?);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct FixedClient(&'static str);

    impl LlmClient for FixedClient {
        fn complete(&self, _request: &CompletionRequest) -> CompletionFuture<'_> {
            let text = self.0.to_string();
            Box::pin(async move {
                Ok(CompletionResponse { text, prompt_tokens: 0, completion_tokens: 0 })
            })
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "m".into(),
            system: None,
            prompt: "p".into(),
            max_tokens: 10,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn default_stream_yields_whole_completion() {
        let client = FixedClient("hello world");
        let text = accumulate(client.stream(&request())).await.unwrap();
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn accumulate_concatenates_fragments() {
        let chunks: Vec<Result<String>> = vec![Ok("[1,".into()), Ok(" 2".into()), Ok("]".into())];
        let text = accumulate(Box::pin(futures::stream::iter(chunks))).await.unwrap();
        assert_eq!(text, "[1, 2]");
    }

    #[tokio::test]
    async fn accumulate_stops_at_first_error() {
        let chunks: Vec<Result<String>> = vec![
            Ok("partial".into()),
            Err(Error::Transport("network error: reset".into())),
            Ok("never".into()),
        ];
        let err = accumulate(Box::pin(futures::stream::iter(chunks))).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
