use crate::command::{HelpCommand, OptionParser, OptionSpec, ParsedOptions, Runner};
use crate::config::Configuration;
use crate::container::Binder;
use crate::errors::{ConstructionError, ConstructionErrorKind};
use crate::log::BootLogger;
use crate::units::ConfigUnit;
use std::sync::Arc;

/// Name of the repeatable option listing YAML configuration files
pub const CONFIG_OPTION: &str = "config";

/// Raw command line arguments the application was started with
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Args(pub Vec<String>);

impl Args {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Unit present in every application.
///
/// Binds the arguments, the boot logger and the option parser, contributes
/// `--config` and `--help`, and lazily provides [`ParsedOptions`], the
/// [`Runner`] and the merged [`Configuration`]. Applications replace parts of
/// it by overriding `CoreUnit` like any other unit.
pub struct CoreUnit {
    args: Vec<String>,
    boot_logger: Arc<dyn BootLogger>,
    program: String,
}

impl CoreUnit {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        boot_logger: Arc<dyn BootLogger>,
    ) -> Self {
        Self {
            args,
            boot_logger,
            program: program.into(),
        }
    }
}

impl ConfigUnit for CoreUnit {
    fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
        binder
            .bind(Args(self.args.clone()))
            .bind(Arc::clone(&self.boot_logger))
            .bind(OptionParser::new(self.program.clone()))
            .add_option(
                OptionSpec::value(CONFIG_OPTION, "yaml_location")
                    .repeatable()
                    .with_description("Specifies YAML config location, which can be a file path."),
            )
            .add_command(HelpCommand)
            .bind_factory(|c| {
                let parser = c.resolve::<OptionParser>()?;
                let args = c.resolve::<Args>()?;
                parser.parse(args.as_slice(), c.commands(), c.options())
            })
            .bind_factory(|c| Ok(Runner::new(c.resolve::<ParsedOptions>()?)))
            .bind_factory(|c| {
                let options = c.resolve::<ParsedOptions>()?;
                Configuration::load(options.values(CONFIG_OPTION)).map_err(|e| {
                    ConstructionError::new(
                        ConstructionErrorKind::Configuration,
                        format!("Failed to load configuration: {}", e),
                    )
                    .with_source(e)
                })
            });
        Ok(())
    }
}

impl std::fmt::Debug for CoreUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreUnit")
            .field("program", &self.program)
            .field("args", &self.args)
            .finish()
    }
}
