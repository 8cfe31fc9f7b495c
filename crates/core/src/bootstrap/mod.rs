//! Application assembly: collects unit providers, composes them and hands
//! the result to the construction container.

pub mod builder;
pub mod core_unit;
pub mod runtime;

pub use builder::{Bootstrap, OverrideBuilder, BUILDER_PROVIDER, CORE_UNIT_PROVIDER};
pub use core_unit::{Args, CoreUnit, CONFIG_OPTION};
pub use runtime::Runtime;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, CommandContext, CommandMetadata, CommandOutcome};
    use crate::container::Binder;
    use crate::errors::{CommandExecutionError, ConstructionError};
    use crate::log::MemoryBootLogger;
    use crate::units::ConfigUnit;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct PingCommand;

    impl Command for PingCommand {
        fn metadata(&self) -> CommandMetadata {
            CommandMetadata::new("ping")
        }

        fn run(
            &self,
            context: &CommandContext<'_>,
        ) -> Result<CommandOutcome, CommandExecutionError> {
            context.boot_logger()?.stdout("pong");
            Ok(CommandOutcome::ok())
        }
    }

    #[derive(Default)]
    struct PingUnit;

    impl ConfigUnit for PingUnit {
        fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
            binder.add_command(PingCommand);
            Ok(())
        }
    }

    #[test]
    fn test_exec_runs_selected_command() {
        let logger = MemoryBootLogger::new();
        let outcome = Bootstrap::app(["--ping"])
            .boot_logger(Arc::new(logger.clone()))
            .unit_type::<PingUnit>()
            .exec();

        assert!(outcome.is_success());
        assert_eq!(logger.stdout_lines(), vec!["pong".to_string()]);
    }

    #[test]
    fn test_help_is_the_fallback_command() {
        let logger = MemoryBootLogger::new();
        let outcome = Bootstrap::app(Vec::<String>::new())
            .program("demo")
            .boot_logger(Arc::new(logger.clone()))
            .unit_type::<PingUnit>()
            .exec();

        assert!(outcome.is_success());
        let help = logger.stdout_lines().join("\n");
        assert!(help.contains("--ping"));
        assert!(help.contains("--config"));
        assert!(help.contains("--help"));
    }

    #[test]
    fn test_runtime_hook_runs_once() {
        struct ReleasingUnit(Arc<AtomicUsize>);

        impl ConfigUnit for ReleasingUnit {
            fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
                let released = Arc::clone(&self.0);
                binder.on_shutdown("pool", move || {
                    released.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
                Ok(())
            }
        }

        let released = Arc::new(AtomicUsize::new(0));
        let runtime = Bootstrap::app(Vec::<String>::new())
            .boot_logger(Arc::new(MemoryBootLogger::new()))
            .unit(ReleasingUnit(Arc::clone(&released)))
            .create_runtime()
            .unwrap();

        assert!(runtime.register_shutdown_hook());
        assert!(!runtime.register_shutdown_hook());
        runtime.shutdown();
        runtime.shutdown();
        drop(runtime);

        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_runtime_exposes_args_and_services() {
        let runtime = Bootstrap::app(["--ping"])
            .args(["--config", "a.yml"])
            .boot_logger(Arc::new(MemoryBootLogger::new()))
            .unit_type::<PingUnit>()
            .create_runtime()
            .unwrap();

        assert_eq!(runtime.args_as_string(), "--ping --config a.yml");
        assert_eq!(runtime.service::<Args>().unwrap().as_slice(), runtime.args());
        assert_eq!(runtime.resolution().composition().len(), 2);
    }
}
