use crate::command::{CommandOutcome, ParsedOptions};
use crate::container::Container;
use crate::errors::{CommandExecutionError, ConstructionError};
use crate::log::BootLogger;
use std::sync::Arc;

/// Name and description of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMetadata {
    name: String,
    description: Option<String>,
}

impl CommandMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// An action selectable from the command line as `--<name>`
pub trait Command: Send + Sync {
    fn metadata(&self) -> CommandMetadata;

    fn run(&self, context: &CommandContext<'_>) -> Result<CommandOutcome, CommandExecutionError>;
}

impl std::fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.metadata().name())
            .finish()
    }
}

/// What a running command can see: the service graph and the parsed command line
pub struct CommandContext<'a> {
    container: &'a Container,
    options: &'a ParsedOptions,
}

impl<'a> CommandContext<'a> {
    pub fn new(container: &'a Container, options: &'a ParsedOptions) -> Self {
        Self { container, options }
    }

    pub fn container(&self) -> &'a Container {
        self.container
    }

    pub fn options(&self) -> &'a ParsedOptions {
        self.options
    }

    /// Resolve a service from the container
    pub fn resolve<T>(&self) -> Result<T, ConstructionError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.container.resolve::<T>()
    }

    pub fn boot_logger(&self) -> Result<Arc<dyn BootLogger>, ConstructionError> {
        self.container.resolve::<Arc<dyn BootLogger>>()
    }
}

/// Prints the rendered command line help
#[derive(Debug, Default, Clone, Copy)]
pub struct HelpCommand;

impl HelpCommand {
    pub const NAME: &'static str = "help";
}

impl Command for HelpCommand {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new(Self::NAME).with_description("Prints this message.")
    }

    fn run(&self, context: &CommandContext<'_>) -> Result<CommandOutcome, CommandExecutionError> {
        let logger = context.boot_logger()?;
        logger.stdout(context.options().help());
        Ok(CommandOutcome::ok())
    }
}
