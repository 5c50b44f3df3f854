//! Error kinds surfaced by the generation pipeline and its collaborators.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds produced while talking to providers or interpreting their output.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// Network, timeout or provider-side failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// A provider was used without its API key configured.
    #[error("missing credential for {provider}: set {env_var}")]
    MissingCredential {
        /// Human-readable provider name.
        provider: &'static str,
        /// Environment variable that should hold the key.
        env_var: &'static str,
    },

    /// Model output contained no bracket pair of the expected kind.
    #[error("no JSON found in model response")]
    NoJsonFound,

    /// A JSON candidate was found but failed to parse.
    #[error("malformed JSON in model response: {0}")]
    MalformedJson(String),

    /// Parsed JSON lacks a required field or has the wrong top-level type.
    #[error("unexpected response shape: {0}")]
    ShapeMismatch(String),

    /// Local file I/O failed.
    #[error("io error: {0}")]
    Io(String),

    /// The tasks file or complexity report is missing or inconsistent.
    #[error("{0}")]
    Store(String),

    /// A configuration value could not be interpreted.
    #[error("invalid configuration: {0}")]
    Config(String),
}

const RETRYABLE_MARKERS: &[&str] =
    &["overloaded", "rate limit", "rate_limit", "429", "timeout", "timed out", "network"];

impl Error {
    /// Whether the retry controller may re-issue the request that produced this error.
    ///
    /// Only transport failures that look like overload, rate limiting, timeouts or
    /// generic network trouble qualify. Everything else fails fast.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(msg) => {
                let lower = msg.to_lowercase();
                RETRYABLE_MARKERS.iter().any(|marker| lower.contains(marker))
            }
            _ => false,
        }
    }

    /// Whether this error came from interpreting model output rather than reaching the model.
    #[must_use]
    pub fn is_output_error(&self) -> bool {
        matches!(self, Self::NoJsonFound | Self::MalformedJson(_) | Self::ShapeMismatch(_))
    }

    /// Renders the single human-readable message shown to the user once budgets are exhausted.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => {
                let lower = msg.to_lowercase();
                if lower.contains("overloaded") {
                    "The AI provider is overloaded right now. Wait a few minutes and try again."
                        .to_string()
                } else if lower.contains("rate limit")
                    || lower.contains("rate_limit")
                    || lower.contains("429")
                {
                    "Rate limit exceeded. Wait a few minutes before making more requests."
                        .to_string()
                } else if lower.contains("timeout") || lower.contains("timed out") {
                    "The request to the AI provider timed out. Try again.".to_string()
                } else if lower.contains("network") {
                    "Could not reach the AI provider. Check your internet connection and try again."
                        .to_string()
                } else if lower.contains("invalid_request") {
                    "The AI provider rejected the request format. Run with DEBUG=true for details."
                        .to_string()
                } else {
                    format!("Error communicating with the AI provider: {msg}")
                }
            }
            Self::MissingCredential { provider, env_var } => {
                format!("{provider} is not configured. Set {env_var} in your environment or .env file.")
            }
            Self::NoJsonFound | Self::MalformedJson(_) | Self::ShapeMismatch(_) => {
                "The AI response could not be turned into valid structured data, even after repair attempts."
                    .to_string()
            }
            Self::Io(msg) | Self::Store(msg) => msg.clone(),
            Self::Config(msg) => format!("Invalid configuration: {msg}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("request timed out: {e}"))
        } else if e.is_connect() || e.is_request() {
            Self::Transport(format!("network error: {e}"))
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_overload_are_retryable() {
        assert!(Error::Transport("Rate limit reached for requests".into()).is_retryable());
        assert!(Error::Transport("Anthropic API error (529): Overloaded".into()).is_retryable());
        assert!(Error::Transport("request timed out".into()).is_retryable());
        assert!(Error::Transport("network error: connection refused".into()).is_retryable());
    }

    #[test]
    fn other_failures_are_not_retryable() {
        assert!(!Error::Transport("invalid x-api-key".into()).is_retryable());
        assert!(!Error::MissingCredential { provider: "Perplexity", env_var: "PERPLEXITY_API_KEY" }
            .is_retryable());
        assert!(!Error::NoJsonFound.is_retryable());
        assert!(!Error::MalformedJson("eof".into()).is_retryable());
    }

    #[test]
    fn user_message_hides_transport_detail_for_known_kinds() {
        let msg = Error::Transport("rate_limit_error: 50 rpm exceeded".into()).user_message();
        assert!(msg.starts_with("Rate limit exceeded"));
        assert!(!msg.contains("50 rpm"));
    }

    #[test]
    fn user_message_names_missing_env_var() {
        let err = Error::MissingCredential { provider: "Anthropic", env_var: "ANTHROPIC_API_KEY" };
        assert!(err.user_message().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn output_errors_are_classified() {
        assert!(Error::NoJsonFound.is_output_error());
        assert!(Error::ShapeMismatch("tasks".into()).is_output_error());
        assert!(!Error::Io("x".into()).is_output_error());
    }
}
