use crate::config::ConfigError;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Where a merged configuration fragment came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Inline,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "Configuration file: {}", path.display()),
            ConfigSource::Inline => write!(f, "Inline configuration"),
        }
    }
}

/// Application configuration merged from one or more YAML documents.
///
/// Later documents win per key; nested mappings are merged recursively.
/// Values are read with dotted paths such as `greeting.message`.
#[derive(Debug, Clone)]
pub struct Configuration {
    root: Value,
    sources: Vec<ConfigSource>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::empty()
    }
}

impl Configuration {
    pub fn empty() -> Self {
        Self {
            root: Value::Mapping(Mapping::new()),
            sources: Vec::new(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::empty();
        config.merge_value(parse_document(yaml)?, ConfigSource::Inline);
        Ok(config)
    }

    /// Load and merge the given files in order
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut config = Self::empty();
        for path in paths {
            let path = path.as_ref();
            let text = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
            config.merge_value(parse_document(&text)?, ConfigSource::File(path.to_path_buf()));
            tracing::debug!("Loaded configuration from {}", path.display());
        }
        Ok(config)
    }

    /// Merge another configuration on top of this one
    pub fn merge(mut self, other: Configuration) -> Self {
        deep_merge(&mut self.root, other.root);
        self.sources.extend(other.sources);
        self
    }

    /// Typed value at a dotted path
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigError> {
        let value = self.lookup(path).ok_or_else(|| {
            ConfigError::missing_required(path, "Add it to one of the --config files")
        })?;
        serde_yaml::from_value(value.clone()).map_err(|e| {
            ConfigError::invalid_value(path, render(value), e.to_string())
        })
    }

    pub fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ConfigError> {
        match self.get(path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        match &self.root {
            Value::Mapping(mapping) => mapping.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    fn merge_value(&mut self, value: Value, source: ConfigSource) {
        deep_merge(&mut self.root, value);
        self.sources.push(source);
    }

    fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.root, |node, segment| match node {
                Value::Mapping(mapping) => mapping.get(segment),
                _ => None,
            })
            .filter(|value| !value.is_null())
    }
}

fn parse_document(yaml: &str) -> Result<Value, ConfigError> {
    let value: Value = serde_yaml::from_str(yaml)?;
    match value {
        Value::Mapping(_) => Ok(value),
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        other => Err(ConfigError::parsing(format!(
            "configuration root must be a mapping, found '{}'",
            render(&other)
        ))),
    }
}

fn deep_merge(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Mapping(target), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, overlay) => *target = overlay,
    }
}

fn render(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|text| text.trim_end().to_string())
        .unwrap_or_else(|_| format!("{:?}", value))
}
