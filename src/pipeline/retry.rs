//! Retry and repair budgets around provider calls.
//!
//! Two independent loops live here. [`call_with_retry`] re-issues a provider
//! request after transient transport failures. [`process_with_repair`] turns
//! raw model text into a validated value, running local cleanup passes and
//! then asking the model to fix its own output.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::extract::{cleanup_candidate, JsonShape};
use super::normalize::parse_candidate;
use super::prompts::repair_prompt;
use crate::error::{Error, Result};
use crate::ports::llm::{accumulate, CompletionRequest, LlmClient};

/// Budgets for transport retries, cleanup passes and repair round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failed transport call.
    pub max_retries: u32,
    /// Delay unit; retry `n` (0-based) waits `(n + 1) * backoff_unit`.
    pub backoff_unit: Duration,
    /// Local cleanup passes over one response before asking for a repair.
    pub cleanup_attempts: u32,
    /// Repair round-trips to the model once cleanup is exhausted.
    pub repair_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_unit: Duration::from_millis(5000),
            cleanup_attempts: 1,
            repair_attempts: 2,
        }
    }
}

impl RetryPolicy {
    /// Default budgets with no waiting between retries.
    #[must_use]
    pub fn immediate() -> Self {
        Self { backoff_unit: Duration::ZERO, ..Self::default() }
    }

    /// Same policy with a different number of cleanup passes.
    #[must_use]
    pub fn with_cleanup_attempts(self, cleanup_attempts: u32) -> Self {
        Self { cleanup_attempts, ..self }
    }

    /// Delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt.saturating_add(1))
    }
}

/// How a provider call delivers its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// One fully materialized response.
    Complete,
    /// Streamed fragments, accumulated before processing.
    Stream,
}

/// Issues `request`, retrying retryable transport failures within `policy`.
///
/// # Errors
///
/// Returns the first non-retryable error, or the last retryable one once
/// `policy.max_retries` is spent.
pub async fn call_with_retry(
    client: &dyn LlmClient,
    request: &CompletionRequest,
    mode: CallMode,
    policy: &RetryPolicy,
) -> Result<String> {
    let mut attempt = 0;
    loop {
        let outcome = match mode {
            CallMode::Complete => client.complete(request).await.map(|response| response.text),
            CallMode::Stream => accumulate(client.stream(request)).await,
        };

        match outcome {
            Ok(text) => {
                if attempt > 0 {
                    info!(attempts = attempt + 1, "provider call succeeded after retry");
                }
                return Ok(text);
            }
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                warn!(
                    retry = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "transient provider error, retrying"
                );
                debug!(retry = attempt + 1, error = %e, "transient provider error detail");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                debug!(attempts = attempt + 1, retryable = e.is_retryable(), error = %e, "provider call failed");
                return Err(e);
            }
        }
    }
}

/// What the model is asked to repair toward.
#[derive(Debug, Clone, Copy)]
pub struct RepairTarget<'a> {
    /// Expected top-level JSON type.
    pub shape: JsonShape,
    /// Schema text quoted in the repair prompt.
    pub schema: &'a str,
}

enum Step {
    Processing { text: String },
    Repairing { text: String, error: Error },
}

/// Turns raw model output into a validated value.
///
/// Each response gets `policy.cleanup_attempts` local passes of extraction,
/// parsing and `validate`. When they all fail with an output error, the text
/// and error go back to the model through `base`'s provider settings, at most
/// `policy.repair_attempts` times. Transport errors during repair go through
/// [`call_with_retry`] and are returned as-is.
///
/// # Errors
///
/// Returns the last output error once both budgets are spent, or the first
/// non-output error from `validate` or the repair call.
pub async fn process_with_repair<T, F>(
    client: &dyn LlmClient,
    base: &CompletionRequest,
    raw: String,
    target: RepairTarget<'_>,
    policy: &RetryPolicy,
    validate: F,
) -> Result<T>
where
    F: Fn(Value) -> Result<T>,
{
    let mut repairs = 0;
    let mut step = Step::Processing { text: raw };

    loop {
        step = match step {
            Step::Processing { text } => {
                match clean_and_validate(&text, target.shape, policy.cleanup_attempts, &validate) {
                    Ok(value) => return Ok(value),
                    Err(error) if error.is_output_error() => Step::Repairing { text, error },
                    Err(error) => return Err(error),
                }
            }
            Step::Repairing { text, error } => {
                if repairs >= policy.repair_attempts {
                    warn!(repairs, "giving up on model output");
                    debug!(repairs, error = %error, "last output error");
                    return Err(error);
                }
                repairs += 1;
                info!(attempt = repairs, max = policy.repair_attempts, "asking model to repair output");
                debug!(attempt = repairs, error = %error, "output error being repaired");

                let prompt = repair_prompt(&text, &error, target.schema, target.shape);
                let request = CompletionRequest {
                    system: Some(prompt.system),
                    prompt: prompt.user,
                    ..base.clone()
                };
                let text = call_with_retry(client, &request, CallMode::Complete, policy).await?;
                Step::Processing { text }
            }
        };
    }
}

fn clean_and_validate<T>(
    text: &str,
    shape: JsonShape,
    passes: u32,
    validate: &impl Fn(Value) -> Result<T>,
) -> Result<T> {
    let mut last = Error::NoJsonFound;
    for pass in 0..passes.max(1) {
        let outcome = cleanup_candidate(text, shape, pass)
            .and_then(|candidate| parse_candidate(&candidate))
            .and_then(validate);
        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if e.is_output_error() => {
                debug!(pass, "cleanup pass failed: {e}");
                last = e;
            }
            Err(e) => return Err(e),
        }
    }
    Err(last)
}
