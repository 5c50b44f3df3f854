//! Live adapters for real external interactions.

pub mod anthropic;
pub mod clock;
pub mod filesystem;
pub mod perplexity;

use crate::error::{Error, Result};

/// Reads a provider API key from the environment at the moment it is needed.
///
/// # Errors
///
/// Returns [`Error::MissingCredential`] when the variable is unset or blank.
pub(crate) fn api_key(provider: &'static str, env_var: &'static str) -> Result<String> {
    std::env::var(env_var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or(Error::MissingCredential { provider, env_var })
}
