use crate::command::{CommandContext, CommandOutcome, HelpCommand, ParsedOptions, FAILURE_EXIT_CODE};
use crate::container::Container;

/// Selects the command requested on the command line and runs it
#[derive(Debug, Clone)]
pub struct Runner {
    options: ParsedOptions,
}

impl Runner {
    pub fn new(options: ParsedOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParsedOptions {
        &self.options
    }

    /// Name of the command that [`Runner::run`] would execute
    pub fn selected_command(&self, container: &Container) -> Result<String, CommandOutcome> {
        match self.options.selected_commands() {
            [] => Ok(container
                .default_command()
                .unwrap_or(HelpCommand::NAME)
                .to_string()),
            [single] => Ok(single.clone()),
            several => Err(CommandOutcome::failed(
                FAILURE_EXIT_CODE,
                format!("CLI options match multiple commands: {}", several.join(", ")),
            )),
        }
    }

    /// Run the selected command; its failures become a failing outcome
    pub fn run(&self, container: &Container) -> CommandOutcome {
        let name = match self.selected_command(container) {
            Ok(name) => name,
            Err(outcome) => return outcome,
        };

        let Some(command) = container.command(&name) else {
            return CommandOutcome::failed(
                FAILURE_EXIT_CODE,
                format!("No command named '{}' is registered", name),
            );
        };

        tracing::debug!("Running command: {}", name);
        let context = CommandContext::new(container, &self.options);
        match command.run(&context) {
            Ok(outcome) => outcome,
            Err(e) => CommandOutcome::failed_with_error(FAILURE_EXIT_CODE, e),
        }
    }
}
