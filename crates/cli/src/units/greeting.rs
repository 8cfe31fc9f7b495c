use anyhow::Context;
use serde::Deserialize;
use strata_core::command::{CommandContext, CommandMetadata, CommandOutcome, OptionSpec};
use strata_core::{
    Binder, Command, CommandExecutionError, ConfigUnit, Configuration, ConstructionError,
};

const DEFAULT_MESSAGE: &str = "Hello";

/// `greeting` section of the YAML configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GreetingConfig {
    pub message: String,
    #[serde(default)]
    pub recipient: Option<String>,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            message: DEFAULT_MESSAGE.to_string(),
            recipient: None,
        }
    }
}

/// Contributes `--greet` and its `--name` option
#[derive(Debug, Default)]
pub struct GreetingUnit;

impl ConfigUnit for GreetingUnit {
    fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
        binder
            .add_command(GreetCommand)
            .add_option(OptionSpec::value("name", "name").with_description("Who to greet."));
        Ok(())
    }
}

pub struct GreetCommand;

impl GreetCommand {
    fn greeting(context: &CommandContext<'_>) -> anyhow::Result<String> {
        let config: Configuration = context.resolve().context("configuration unavailable")?;
        let greeting = config
            .get_optional::<GreetingConfig>("greeting")
            .context("invalid 'greeting' configuration")?
            .unwrap_or_default();

        let recipient = context
            .options()
            .value("name")
            .map(str::to_string)
            .or(greeting.recipient)
            .unwrap_or_else(|| "world".to_string());

        Ok(format!("{}, {}!", greeting.message, recipient))
    }
}

impl Command for GreetCommand {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("greet")
            .with_description("Prints a greeting read from the 'greeting.message' configuration.")
    }

    fn run(&self, context: &CommandContext<'_>) -> Result<CommandOutcome, CommandExecutionError> {
        let line = Self::greeting(context)
            .map_err(|e| CommandExecutionError::new("greet", format!("{:#}", e)))?;
        context.boot_logger()?.stdout(&line);
        Ok(CommandOutcome::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use strata_core::{Bootstrap, MemoryBootLogger};

    #[test]
    fn test_greets_with_configured_message() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"greeting:\n  message: Hi\n  recipient: team\n")
            .unwrap();
        let path = file.path().display().to_string();

        let logger = MemoryBootLogger::new();
        let outcome = Bootstrap::app(["--greet", "--config", path.as_str()])
            .boot_logger(Arc::new(logger.clone()))
            .unit_type::<GreetingUnit>()
            .exec();

        assert!(outcome.is_success());
        assert_eq!(logger.stdout_lines(), vec!["Hi, team!".to_string()]);
    }

    #[test]
    fn test_name_option_wins_over_configuration() {
        let logger = MemoryBootLogger::new();
        let outcome = Bootstrap::app(["--greet", "--name", "Ada"])
            .boot_logger(Arc::new(logger.clone()))
            .unit_type::<GreetingUnit>()
            .exec();

        assert!(outcome.is_success());
        assert_eq!(logger.stdout_lines(), vec!["Hello, Ada!".to_string()]);
    }
}
