use std::fmt;
use thiserror::Error;

/// Boxed payload for failures raised by user code (unit producers, binding factories)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal startup errors raised while composing and constructing the application
#[derive(Debug, Error)]
pub enum BootError {
    #[error("Error instantiating unit '{unit_type}' from provider '{provider}': {source}")]
    ProviderInstantiation {
        provider: String,
        unit_type: String,
        #[source]
        source: BoxError,
    },

    #[error(
        "Composition conflict: providers [{}] all produce '{unit_type}' and none of them overrides it",
        providers.join(", ")
    )]
    CompositionConflict {
        unit_type: String,
        providers: Vec<String>,
    },

    #[error("Override cycle detected: {}", format_cycle(types))]
    OverrideCycle { types: Vec<String> },

    #[error("Construction failed: {0}")]
    Construction(#[from] ConstructionError),
}

fn format_cycle(types: &[String]) -> String {
    match types.first() {
        Some(first) => format!("{} -> {}", types.join(" -> "), first),
        None => String::new(),
    }
}

impl BootError {
    /// Wrap a producer failure
    pub fn instantiation(
        provider: impl Into<String>,
        unit_type: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::ProviderInstantiation {
            provider: provider.into(),
            unit_type: unit_type.into(),
            source: source.into(),
        }
    }

    /// Check if the error is a composition conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::CompositionConflict { .. })
    }

    /// Check if the error is an override cycle
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::OverrideCycle { .. })
    }

    /// Check if the error is a producer failure
    pub fn is_instantiation(&self) -> bool {
        matches!(self, Self::ProviderInstantiation { .. })
    }
}

/// Discriminator carried by every construction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionErrorKind {
    /// The command line could not be parsed
    OptionParsing,
    /// A requested binding does not exist
    MissingBinding,
    /// The same key is bound by two independent units
    DuplicateBinding,
    /// A binding factory (transitively) requested itself
    CircularDependency,
    /// A binding factory or unit configuration failed
    Provision,
    /// Configuration files could not be loaded or read
    Configuration,
}

impl ConstructionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstructionErrorKind::OptionParsing => "option parsing",
            ConstructionErrorKind::MissingBinding => "missing binding",
            ConstructionErrorKind::DuplicateBinding => "duplicate binding",
            ConstructionErrorKind::CircularDependency => "circular dependency",
            ConstructionErrorKind::Provision => "provision",
            ConstructionErrorKind::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ConstructionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure of the construction container to build or wire the service graph
#[derive(Debug, Error)]
#[error("{kind} error: {message}")]
pub struct ConstructionError {
    kind: ConstructionErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ConstructionError {
    pub fn new(kind: ConstructionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn missing_binding(key: impl fmt::Display) -> Self {
        Self::new(
            ConstructionErrorKind::MissingBinding,
            format!("No binding for {}", key),
        )
    }

    pub fn provision(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::new(ConstructionErrorKind::Provision, message).with_source(source)
    }

    pub fn kind(&self) -> ConstructionErrorKind {
        self.kind
    }

    /// The message without the kind prefix
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_option_parsing(&self) -> bool {
        self.kind == ConstructionErrorKind::OptionParsing
    }
}

/// Malformed command line, reported with the parser's own message
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct OptionParsingError {
    message: String,
}

impl OptionParsingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<OptionParsingError> for ConstructionError {
    fn from(error: OptionParsingError) -> Self {
        ConstructionError::new(ConstructionErrorKind::OptionParsing, error.message)
    }
}

/// Failure of a selected command while it runs
#[derive(Debug, Error)]
#[error("Command '{command}' failed: {message}")]
pub struct CommandExecutionError {
    command: String,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl CommandExecutionError {
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ConstructionError> for CommandExecutionError {
    fn from(error: ConstructionError) -> Self {
        CommandExecutionError::new("<wiring>", error.message.clone()).with_source(error)
    }
}
