use strata_core::command::{CommandContext, CommandMetadata, CommandOutcome};
use strata_core::{
    Binder, Command, CommandExecutionError, ConfigUnit, ConfigUnitProvider, ConstructionError,
};

/// Discovered through the plugin registry; contributes `--clock`
#[derive(Debug, Default)]
pub struct ClockUnit;

impl ClockUnit {
    /// Registry entry point
    pub fn provider() -> ConfigUnitProvider {
        ConfigUnitProvider::of::<ClockUnit>()
    }
}

impl ConfigUnit for ClockUnit {
    fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
        binder.add_command(ClockCommand);
        Ok(())
    }
}

pub struct ClockCommand;

impl Command for ClockCommand {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("clock").with_description("Prints the current local time.")
    }

    fn run(&self, context: &CommandContext<'_>) -> Result<CommandOutcome, CommandExecutionError> {
        let now = chrono::Local::now();
        context.boot_logger()?.stdout(&now.to_rfc3339());
        Ok(CommandOutcome::ok())
    }
}
