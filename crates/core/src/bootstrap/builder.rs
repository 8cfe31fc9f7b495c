use crate::bootstrap::runtime::report_outcome;
use crate::bootstrap::{CoreUnit, Runtime};
use crate::command::{CommandOutcome, FAILURE_EXIT_CODE};
use crate::composition::{CompositionEngine, Resolution};
use crate::container::{DefaultInjector, Injector};
use crate::errors::{BootError, BoxError};
use crate::log::{BootLogger, DefaultBootLogger};
use crate::units::{ConfigUnit, ConfigUnitProvider, PluginRegistry, UnitTypeId};
use std::sync::Arc;

/// Provider name of the always-present core unit
pub const CORE_UNIT_PROVIDER: &str = "CoreUnit";

/// Provider name of unit instances registered directly on the builder
pub const BUILDER_PROVIDER: &str = "Bootstrap";

const DEFAULT_PROGRAM: &str = "app";

/// Fluent builder collecting everything an application is composed of.
///
/// ```no_run
/// use strata_core::Bootstrap;
///
/// Bootstrap::app(std::env::args().skip(1))
///     .auto_load_units()
///     .run();
/// ```
pub struct Bootstrap {
    program: String,
    args: Vec<String>,
    boot_logger: Arc<dyn BootLogger>,
    providers: Vec<ConfigUnitProvider>,
    auto_load: bool,
    registries: Vec<Arc<dyn PluginRegistry>>,
    injector: Arc<dyn Injector>,
}

impl Bootstrap {
    /// Start an application with the given command line arguments
    pub fn app<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            boot_logger: Arc::new(DefaultBootLogger::default()),
            providers: Vec::new(),
            auto_load: false,
            registries: Vec::new(),
            injector: Arc::new(DefaultInjector),
        }
    }

    /// Program name shown in the help output
    pub fn program(mut self, name: impl Into<String>) -> Self {
        self.program = name.into();
        self
    }

    /// Append more arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn boot_logger(mut self, logger: Arc<dyn BootLogger>) -> Self {
        self.boot_logger = logger;
        self
    }

    /// Register a unit instance; its provider is named after the builder
    pub fn unit<M: ConfigUnit>(self, unit: M) -> Self {
        self.provider(ConfigUnitProvider::instance(BUILDER_PROVIDER, unit))
    }

    /// Register a unit built by a factory when the application is composed
    pub fn unit_factory<M, F>(self, factory: F) -> Self
    where
        M: ConfigUnit,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.provider(ConfigUnitProvider::factory(factory))
    }

    /// Register a named unit factory that may fail
    pub fn try_unit_factory<M, F, E>(self, name: impl Into<String>, factory: F) -> Self
    where
        M: ConfigUnit,
        F: Fn() -> Result<M, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.provider(ConfigUnitProvider::try_factory(factory).named(name))
    }

    /// Register a unit by type
    pub fn unit_type<M: ConfigUnit + Default>(self) -> Self {
        self.provider(ConfigUnitProvider::of::<M>())
    }

    pub fn provider(mut self, provider: ConfigUnitProvider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Start declaring a unit that overrides the given unit types
    pub fn override_units<I>(self, targets: I) -> OverrideBuilder
    where
        I: IntoIterator<Item = UnitTypeId>,
    {
        OverrideBuilder {
            bootstrap: self,
            targets: targets.into_iter().collect(),
        }
    }

    pub fn override_unit<M: ConfigUnit>(self) -> OverrideBuilder {
        self.override_units([UnitTypeId::of::<M>()])
    }

    /// Include the units found by the plugin registries
    pub fn auto_load_units(mut self) -> Self {
        self.auto_load = true;
        self
    }

    /// Add a registry consulted when auto-loading is enabled
    pub fn plugin_registry<R: PluginRegistry + 'static>(mut self, registry: R) -> Self {
        self.registries.push(Arc::new(registry));
        self
    }

    /// Replace the construction container
    pub fn injector<J: Injector + 'static>(mut self, injector: J) -> Self {
        self.injector = Arc::new(injector);
        self
    }

    /// Compose and construct the application without running anything
    pub fn create_runtime(self) -> Result<Runtime, BootError> {
        let Bootstrap {
            program,
            args,
            boot_logger,
            providers: explicit,
            auto_load,
            registries,
            injector,
        } = self;

        let core = CoreUnit::new(program, args.clone(), Arc::clone(&boot_logger));
        let mut providers = Vec::with_capacity(explicit.len() + 1);
        providers.push(ConfigUnitProvider::instance(CORE_UNIT_PROVIDER, core));
        providers.extend(explicit);

        if auto_load {
            for registry in &registries {
                let discovered = registry.discover();
                tracing::debug!("Plugin registry discovered {} unit providers", discovered.len());
                providers.extend(discovered);
            }
        }

        let resolution = CompositionEngine::new(providers).resolve()?;
        trace_resolution(boot_logger.as_ref(), &resolution);

        let container = injector.construct(resolution.composition())?;
        Ok(Runtime::new(container, resolution, args, boot_logger))
    }

    /// Create the runtime and run the selected command, reporting failures
    /// through the boot logger. Resources are released before returning.
    pub fn exec(self) -> CommandOutcome {
        let logger = Arc::clone(&self.boot_logger);
        let args = self.args.join(" ");

        let outcome = match self.create_runtime() {
            Ok(runtime) => {
                runtime.register_shutdown_hook();
                runtime.run()
            }
            Err(e) => CommandOutcome::failed_with_error(FAILURE_EXIT_CODE, e),
        };

        report_outcome(logger.as_ref(), &args, &outcome);
        outcome
    }

    /// [`Bootstrap::exec`], then exit the process with the outcome's code
    pub fn run(self) -> ! {
        self.exec().exit()
    }
}

fn trace_resolution(logger: &dyn BootLogger, resolution: &Resolution) {
    for line in resolution.diagnostics() {
        logger.trace(&line);
    }
    for skipped in resolution.skipped() {
        logger.trace(&skipped.to_string());
    }

    if logger.is_trace() {
        match serde_json::to_string(&resolution.report()) {
            Ok(report) => tracing::debug!(report = %report, "Composition report"),
            Err(e) => tracing::warn!("Failed to serialize composition report: {}", e),
        }
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("providers", &self.providers)
            .field("auto_load", &self.auto_load)
            .field("registries", &self.registries.len())
            .finish()
    }
}

/// Collects the unit that overrides the targets chosen with
/// [`Bootstrap::override_units`]
pub struct OverrideBuilder {
    bootstrap: Bootstrap,
    targets: Vec<UnitTypeId>,
}

impl OverrideBuilder {
    pub fn with_unit<M: ConfigUnit>(self, unit: M) -> Bootstrap {
        self.with_provider(ConfigUnitProvider::instance(BUILDER_PROVIDER, unit))
    }

    pub fn with_factory<M, F>(self, factory: F) -> Bootstrap
    where
        M: ConfigUnit,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.with_provider(ConfigUnitProvider::factory(factory))
    }

    pub fn with_provider(self, provider: ConfigUnitProvider) -> Bootstrap {
        let OverrideBuilder { bootstrap, targets } = self;
        bootstrap.provider(provider.overriding(targets))
    }
}
