use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::domain::models::CapabilityRegistry;

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".todo-agent";

/// Prefix for environment overrides, e.g. `TODO_AGENT_AGENT__MODEL`.
pub const ENV_PREFIX: &str = "TODO_AGENT_";

/// Upper bound accepted for `agent.max_turns`.
pub const MAX_TURNS_LIMIT: u32 = 500;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_turns: {0}. Must be between 1 and {MAX_TURNS_LIMIT}")]
    InvalidMaxTurns(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .todo-agent/config.yaml (project config)
    /// 3. .todo-agent/local.yaml (local overrides, optional)
    /// 4. Environment variables (TODO_AGENT_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(Path::new(CONFIG_DIR).join("config.yaml")))
            .merge(Yaml::file(Path::new(CONFIG_DIR).join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise from the project hierarchy.
    pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let agent = &config.agent;

        if agent.max_turns == 0 || agent.max_turns > MAX_TURNS_LIMIT {
            return Err(ConfigError::InvalidMaxTurns(agent.max_turns));
        }
        if agent.model.trim().is_empty() {
            return Err(ConfigError::EmptyField("agent.model"));
        }
        if agent.claude_path.trim().is_empty() {
            return Err(ConfigError::EmptyField("agent.claude_path"));
        }

        if let Some(ref ids) = agent.capabilities {
            if ids.is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "agent.capabilities cannot be an empty list".to_string(),
                ));
            }
            if let Some(unknown) = ids.iter().find(|id| CapabilityRegistry::lookup(id).is_none()) {
                return Err(ConfigError::UnknownCapability(unknown.clone()));
            }
        }

        if let Some(name) = agent.env.keys().find(|k| k.is_empty() || k.contains('=')) {
            return Err(ConfigError::ValidationFailed(format!(
                "invalid environment variable name '{name}'"
            )));
        }

        let sqlite = &config.providers.sqlite;
        let filesystem = &config.providers.filesystem;
        for (field, value) in [
            ("providers.sqlite.command", &sqlite.command),
            ("providers.sqlite.package", &sqlite.package),
            ("providers.sqlite.db_path", &sqlite.db_path),
            ("providers.filesystem.command", &filesystem.command),
            ("providers.filesystem.package", &filesystem.package),
            ("providers.filesystem.root", &filesystem.root),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField(field));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
