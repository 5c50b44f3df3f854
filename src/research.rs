//! Lazily initialized research provider.
//!
//! The research client is built at most once per process, on the first request
//! that needs it. After that it is shared read-only: its credential and endpoint
//! never change. Only [`LazyClient::get`] writes the slot, and the slot is a
//! `OnceLock`, so concurrent first uses still leave exactly one client installed.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::adapters::live::perplexity::PerplexityClient;
use crate::error::Result;
use crate::ports::llm::LlmClient;

type Factory = Box<dyn Fn() -> Result<Arc<dyn LlmClient>> + Send + Sync>;

/// Guarded accessor for a client that is constructed on first use.
///
/// A failed construction (for example a missing API key) is returned to the
/// caller and leaves the slot empty; nothing is cached and nothing is retried.
pub struct LazyClient {
    slot: OnceLock<Arc<dyn LlmClient>>,
    factory: Factory,
}

impl LazyClient {
    /// Wraps a factory that builds the client on first use.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn LlmClient>> + Send + Sync + 'static,
    {
        Self { slot: OnceLock::new(), factory: Box::new(factory) }
    }

    /// Wraps an already built client.
    #[must_use]
    pub fn ready(client: Arc<dyn LlmClient>) -> Self {
        let slot = OnceLock::new();
        let _ = slot.set(Arc::clone(&client));
        Self { slot, factory: Box::new(move || Ok(Arc::clone(&client))) }
    }

    /// The process-wide research client backed by Perplexity.
    #[must_use]
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<LazyClient>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| {
            Arc::new(Self::new(|| {
                let client: Arc<dyn LlmClient> = Arc::new(PerplexityClient::from_env()?);
                Ok(client)
            }))
        }))
    }

    /// Returns the client, constructing it on the first successful call.
    ///
    /// # Errors
    ///
    /// Returns whatever error the factory produced, typically
    /// [`crate::error::Error::MissingCredential`].
    pub fn get(&self) -> Result<Arc<dyn LlmClient>> {
        if let Some(client) = self.slot.get() {
            return Ok(Arc::clone(client));
        }
        let built = (self.factory)()?;
        debug!("research client initialized");
        Ok(Arc::clone(self.slot.get_or_init(|| built)))
    }

    /// Whether the client has been constructed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.slot.get().is_some()
    }
}
