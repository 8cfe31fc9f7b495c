//! Composition engine for modular applications.
//!
//! Configuration units are registered through providers, resolved into
//! override-aware layers, wired by a construction container and finally run
//! as a command selected on the command line.

pub mod bootstrap;
pub mod command;
pub mod composition;
pub mod config;
pub mod container;
pub mod errors;
pub mod log;
pub mod logging;
pub mod units;

pub use bootstrap::{Bootstrap, CoreUnit, OverrideBuilder, Runtime};
pub use command::{
    Command, CommandContext, CommandMetadata, CommandOutcome, OptionSpec, ParsedOptions, Runner,
};
pub use composition::{CompositionEngine, Resolution, ResolvedComposition};
pub use config::{BootConfig, ConfigError, Configuration};
pub use container::{Binder, Container, DefaultInjector, Injector};
pub use errors::{
    BootError, BoxError, CommandExecutionError, ConstructionError, ConstructionErrorKind,
    OptionParsingError,
};
pub use log::{BootLogger, DefaultBootLogger, MemoryBootLogger};
pub use logging::{init_logging, LoggingConfig};
pub use units::{ConfigUnit, ConfigUnitProvider, PluginRegistry, StaticRegistry, UnitTypeId};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version
pub fn version() -> &'static str {
    VERSION
}
