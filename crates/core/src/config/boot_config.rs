use crate::config::ConfigError;
use crate::log::{BootLogger, DefaultBootLogger};
use crate::logging::LoggingConfig;
use std::env;
use std::sync::Arc;

pub const TRACE_VAR: &str = "STRATA_TRACE";
pub const LOG_VAR: &str = "STRATA_LOG";
pub const LOG_JSON_VAR: &str = "STRATA_LOG_JSON";

/// Process level settings read before anything is composed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootConfig {
    pub trace: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            trace: false,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl BootConfig {
    /// Load from `STRATA_TRACE`, `STRATA_LOG` and `STRATA_LOG_JSON`
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let trace = match env::var(TRACE_VAR) {
            Ok(value) => parse_bool(TRACE_VAR, &value)?,
            Err(_) => defaults.trace,
        };

        let log_level = env::var(LOG_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.log_level);

        let log_json = match env::var(LOG_JSON_VAR) {
            Ok(value) => parse_bool(LOG_JSON_VAR, &value)?,
            Err(_) => defaults.log_json,
        };

        Ok(Self {
            trace,
            log_level,
            log_json,
        })
    }

    /// Console boot logger honoring the trace flag
    pub fn boot_logger(&self) -> Arc<dyn BootLogger> {
        Arc::new(DefaultBootLogger::new(self.trace))
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            json_format: self.log_json,
            env_filter: None,
        }
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::invalid_value(
            field,
            value,
            "true/false, yes/no, on/off or 1/0",
        )),
    }
}
