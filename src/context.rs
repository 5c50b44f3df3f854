//! Service context bundling configuration and port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapters::live::anthropic::AnthropicClient;
use crate::adapters::live::clock::SystemClock;
use crate::adapters::live::filesystem::DiskFileSystem;
use crate::adapters::live::perplexity::PerplexityClient;
use crate::adapters::recording::RecordingLlmClient;
use crate::adapters::replaying::ReplayingLlmClient;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::pipeline::retry::RetryPolicy;
use crate::ports::clock::Clock;
use crate::ports::filesystem::FileSystem;
use crate::ports::llm::LlmClient;
use crate::research::LazyClient;

/// Everything a command needs to reach the outside world.
///
/// Constructors wire up different adapter sets (live, recording, replaying).
pub struct ServiceContext {
    /// Read-only process configuration.
    pub config: Config,
    /// Clock for timestamps.
    pub clock: Box<dyn Clock>,
    /// Filesystem for PRDs, task files and reports.
    pub fs: Box<dyn FileSystem>,
    /// Primary text-generation provider.
    pub llm: Arc<dyn LlmClient>,
    /// Research provider, built on first use.
    pub research: Arc<LazyClient>,
    /// Retry and repair budgets.
    pub retry: RetryPolicy,
}

impl ServiceContext {
    /// Live context: Anthropic primary, process-wide lazy Perplexity research client.
    #[must_use]
    pub fn live(config: Config) -> Self {
        Self {
            config,
            clock: Box::new(SystemClock),
            fs: Box::new(DiskFileSystem),
            llm: Arc::new(AnthropicClient::new()),
            research: LazyClient::global(),
            retry: RetryPolicy::default(),
        }
    }

    /// Live context whose provider calls are captured by `session`.
    ///
    /// The research client stays lazy: its recording wrapper is only built
    /// once the real client has been constructed.
    #[must_use]
    pub fn recording(config: Config, session: &RecordingSession) -> Self {
        let primary = Arc::clone(&session.recorder);
        let secondary = Arc::clone(&session.recorder);
        let research = LazyClient::new(move || {
            let inner: Arc<dyn LlmClient> = Arc::new(PerplexityClient::from_env()?);
            let recorded: Arc<dyn LlmClient> =
                Arc::new(RecordingLlmClient::new("research", inner, Arc::clone(&secondary)));
            Ok(recorded)
        });

        Self {
            llm: Arc::new(RecordingLlmClient::new("llm", Arc::new(AnthropicClient::new()), primary)),
            research: Arc::new(research),
            ..Self::live(config)
        }
    }

    /// Context serving both providers from one cassette file.
    ///
    /// A cassette without `research` interactions behaves like a missing
    /// `PERPLEXITY_API_KEY`. Backoff delays are skipped during replay.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path, config: Config) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("Failed to read cassette {}: {e}", path.display())))?;
        let cassette: Cassette = serde_yaml::from_str(&content)
            .map_err(|e| Error::Io(format!("Failed to parse cassette {}: {e}", path.display())))?;
        Ok(Self::replaying_cassette(&cassette, config))
    }

    /// Context serving both providers from an in-memory cassette.
    #[must_use]
    pub fn replaying_cassette(cassette: &Cassette, config: Config) -> Self {
        let replayer = CassetteReplayer::new(cassette);
        let has_research = replayer.has_port("research");
        let replayer = Arc::new(Mutex::new(replayer));

        let research = if has_research {
            LazyClient::ready(Arc::new(ReplayingLlmClient::new("research", Arc::clone(&replayer))))
        } else {
            LazyClient::new(|| {
                Err(Error::MissingCredential {
                    provider: "Perplexity",
                    env_var: "PERPLEXITY_API_KEY",
                })
            })
        };

        Self {
            config,
            clock: Box::new(SystemClock),
            fs: Box::new(DiskFileSystem),
            llm: Arc::new(ReplayingLlmClient::new("llm", replayer)),
            research: Arc::new(research),
            retry: RetryPolicy::immediate(),
        }
    }
}
