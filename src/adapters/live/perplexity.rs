//! Live adapter for the research provider (Perplexity chat completions).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::api_key;
use crate::error::{Error, Result};
use crate::ports::llm::{CompletionFuture, CompletionRequest, CompletionResponse, LlmClient};

const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai/chat/completions";
const PROVIDER: &str = "Perplexity";
const API_KEY_VAR: &str = "PERPLEXITY_API_KEY";

/// Research-oriented client with web search behind an OpenAI-style endpoint.
///
/// Unlike the primary client, the key is captured once at construction: the
/// client only exists after a successful lazy initialization.
pub struct PerplexityClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl PerplexityClient {
    /// Builds a client from `PERPLEXITY_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] when the key is not set.
    pub fn from_env() -> Result<Self> {
        let api_key = api_key(PROVIDER, API_KEY_VAR)?;
        Ok(Self { client: Client::new(), api_key, base_url: PERPLEXITY_API_URL.to_string() })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl LlmClient for PerplexityClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let mut messages = Vec::with_capacity(2);
            if let Some(system) = request.system.as_deref() {
                messages.push(ChatMessage { role: "system", content: system });
            }
            messages.push(ChatMessage { role: "user", content: &request.prompt });

            let body = ChatRequest {
                model: &request.model,
                messages,
                max_tokens: request.max_tokens,
                temperature: request.temperature,
            };

            debug!(model = %request.model, "sending Perplexity request");
            let response = self
                .client
                .post(&self.base_url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            let response_text = response.text().await.map_err(|e| {
                Error::Transport(format!("Failed to read Perplexity API response: {e}"))
            })?;
            if !status.is_success() {
                return Err(Error::Transport(format!(
                    "Perplexity API error ({}): {response_text}",
                    status.as_u16()
                )));
            }

            let parsed: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
                Error::Transport(format!("Failed to parse Perplexity API response: {e}"))
            })?;
            let text = parsed
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content)
                .unwrap_or_default();
            let (prompt_tokens, completion_tokens) =
                parsed.usage.map_or((0, 0), |u| (u.prompt_tokens, u.completion_tokens));

            Ok(CompletionResponse { text, prompt_tokens, completion_tokens })
        })
    }
}
