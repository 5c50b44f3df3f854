//! Core library entry for the `tasksmith` CLI.
//!
//! The interesting part lives in [`pipeline`]: prompts go out through an
//! [`ports::LlmClient`], and the text that comes back is extracted, validated,
//! cleaned up and, when needed, repaired by the model itself.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod ports;
pub mod research;
pub mod tasks;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// Loads `.env` and the process configuration, installs logging, then
/// dispatches the parsed command.
///
/// # Errors
///
/// Returns an error string when argument parsing, configuration or the command fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    let config = config::Config::from_env().map_err(|err| err.user_message())?;
    logging::init(&config);
    commands::dispatch(&cli.command, config)
}
