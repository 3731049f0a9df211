//! Layered settings: defaults, then an optional TOML file, then `MEETCTL_*` env vars.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use meeting_engine::EngineConfig;
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "meetctl.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, e.g. `warn` or `meeting_engine=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit `path` must exist; the default `meetctl.toml` in the working
    /// directory is optional. Environment variables such as
    /// `MEETCTL_ENGINE__UTC_OFFSET=+05:30` or `MEETCTL_LOGGING__LEVEL=debug`
    /// take precedence over the file.
    ///
    /// # Errors
    /// Returns an error if the file is missing (when given explicitly),
    /// unreadable, or does not deserialize into `Settings`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        Config::builder()
            .add_source(File::from(file.as_path()).required(required))
            .add_source(
                Environment::with_prefix("MEETCTL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load configuration from {}", file.display()))?
            .try_deserialize::<Settings>()
            .context("Invalid configuration")
    }
}
