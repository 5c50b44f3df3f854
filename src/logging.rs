//! Tracing subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Returns the default filter directive for the given configuration.
///
/// `DEBUG=true` forces debug output for this crate; otherwise `LOG_LEVEL` applies.
#[must_use]
pub fn default_directive(config: &Config) -> String {
    let level = if config.debug {
        "debug"
    } else {
        match config.log_level.as_str() {
            level @ ("trace" | "debug" | "info" | "warn" | "error") => level,
            _ => "info",
        }
    };
    format!("tasksmith={level}")
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over configuration.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(config).into());
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
