//! Process-wide configuration, read once at startup and never mutated.

use std::str::FromStr;

use crate::error::{Error, Result};

/// Default primary model.
pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
/// Default research model.
pub const DEFAULT_PERPLEXITY_MODEL: &str = "sonar-pro";

/// Settings consumed by the generation pipeline and the CLI.
///
/// API keys are deliberately absent: providers look them up on first use.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Primary model identifier.
    pub model: String,
    /// Research provider model identifier.
    pub perplexity_model: String,
    /// Maximum output tokens per request.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Emit technical error detail and debug logs.
    pub debug: bool,
    /// Default log level when `debug` is off.
    pub log_level: String,
    /// Subtask count used when the caller does not give one.
    pub default_subtasks: u32,
    /// Priority suggested to the model for generated tasks.
    pub default_priority: String,
    /// Project name recorded in generated metadata.
    pub project_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            perplexity_model: DEFAULT_PERPLEXITY_MODEL.to_string(),
            max_tokens: 4000,
            temperature: 0.7,
            debug: false,
            log_level: "info".to_string(),
            default_subtasks: 3,
            default_priority: "medium".to_string(),
            project_name: "Task Master".to_string(),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a numeric or boolean value cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a numeric or boolean value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            model: get("MODEL").unwrap_or(defaults.model),
            perplexity_model: get("PERPLEXITY_MODEL").unwrap_or(defaults.perplexity_model),
            max_tokens: parse_or("MAX_TOKENS", get("MAX_TOKENS"), defaults.max_tokens)?,
            temperature: parse_or("TEMPERATURE", get("TEMPERATURE"), defaults.temperature)?,
            debug: parse_bool("DEBUG", get("DEBUG"), defaults.debug)?,
            log_level: get("LOG_LEVEL").map_or(defaults.log_level, |v| v.to_lowercase()),
            default_subtasks: parse_or(
                "DEFAULT_SUBTASKS",
                get("DEFAULT_SUBTASKS"),
                defaults.default_subtasks,
            )?,
            default_priority: get("DEFAULT_PRIORITY").unwrap_or(defaults.default_priority),
            project_name: get("PROJECT_NAME").unwrap_or(defaults.project_name),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => {
            raw.parse().map_err(|_| Error::Config(format!("{key}={raw:?} is not a valid number")))
        }
    }
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(Error::Config(format!("{key}={other:?} is not a boolean"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn values_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("MODEL", "claude-test"),
            ("MAX_TOKENS", "64000"),
            ("TEMPERATURE", "0.2"),
            ("DEBUG", "true"),
            ("DEFAULT_SUBTASKS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.model, "claude-test");
        assert_eq!(config.max_tokens, 64000);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert!(config.debug);
        assert_eq!(config.default_subtasks, 5);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[("MODEL", "  ")])).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn bad_number_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("MAX_TOKENS", "lots")])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("MAX_TOKENS")));
    }

    #[test]
    fn bad_bool_is_a_config_error() {
        assert!(Config::from_lookup(lookup(&[("DEBUG", "maybe")])).is_err());
    }
}
