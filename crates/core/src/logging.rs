//! # Structured logging
//!
//! Installs a `tracing-subscriber` stack for launchers. Library code only
//! emits events; nothing is printed until a subscriber is installed.

use crate::errors::BoxError;
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration for launchers
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Environment filter (supports directives like "strata_core=debug,strata=info")
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Minimal output for test runs
    pub fn test() -> Self {
        Self {
            level: "error".to_string(),
            ..Self::default()
        }
    }

    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    fn filter(&self) -> Result<EnvFilter, BoxError> {
        let directives = self.env_filter.as_deref().unwrap_or(&self.level);
        Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directives))?)
    }
}

/// Install the global subscriber. Events go to stderr so command output on
/// stdout stays clean. Fails if a subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<(), BoxError> {
    let filter = config.filter()?;

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr))
            .try_init()?;
    }

    tracing::debug!(
        target: "strata::logging",
        "Logging initialized (level: {}, format: {})",
        config.level,
        if config.json_format { "JSON" } else { "text" }
    );

    Ok(())
}
