use crate::command::{CommandOutcome, Runner, FAILURE_EXIT_CODE};
use crate::composition::Resolution;
use crate::container::Container;
use crate::errors::ConstructionError;
use crate::log::BootLogger;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A constructed application, ready to run its selected command.
///
/// Once [`Runtime::register_shutdown_hook`] has been called, dropping the
/// runtime releases the container's resources.
pub struct Runtime {
    container: Container,
    resolution: Resolution,
    args: Vec<String>,
    boot_logger: Arc<dyn BootLogger>,
    hook_registered: AtomicBool,
}

impl Runtime {
    pub(crate) fn new(
        container: Container,
        resolution: Resolution,
        args: Vec<String>,
        boot_logger: Arc<dyn BootLogger>,
    ) -> Self {
        Self {
            container,
            resolution,
            args,
            boot_logger,
            hook_registered: AtomicBool::new(false),
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Resolve a service from the container
    pub fn service<T>(&self) -> Result<T, ConstructionError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.container.resolve::<T>()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn args_as_string(&self) -> String {
        self.args.join(" ")
    }

    pub fn boot_logger(&self) -> &Arc<dyn BootLogger> {
        &self.boot_logger
    }

    /// Composition this runtime was built from, with its override diagnostics
    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Arrange for [`Runtime::shutdown`] to run when the runtime is dropped.
    /// Returns false if the hook was already registered.
    pub fn register_shutdown_hook(&self) -> bool {
        let first = !self.hook_registered.swap(true, Ordering::SeqCst);
        if first {
            tracing::debug!("Registered runtime shutdown hook");
        }
        first
    }

    /// Run the command selected on the command line.
    ///
    /// Never fails: malformed options and wiring errors become a failing
    /// outcome with exit code 1.
    pub fn run(&self) -> CommandOutcome {
        match self.container.resolve::<Runner>() {
            Ok(runner) => runner.run(&self.container),
            Err(e) if e.is_option_parsing() => {
                CommandOutcome::failed(FAILURE_EXIT_CODE, e.message().to_string())
            }
            Err(e) => CommandOutcome::failed_with_error(FAILURE_EXIT_CODE, e),
        }
    }

    /// Release container resources. Only the first call has an effect.
    pub fn shutdown(&self) {
        let manager = self.container.shutdown_manager();
        if manager.is_completed() {
            return;
        }
        let failures = manager.shutdown();
        if failures > 0 {
            tracing::warn!("{} shutdown hook(s) failed", failures);
        } else {
            tracing::debug!("Runtime shut down");
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if self.hook_registered.load(Ordering::SeqCst) {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("args", &self.args)
            .field("layers", &self.resolution.composition().len())
            .field("container", &self.container)
            .finish()
    }
}

/// Report a failing outcome through the boot logger
pub(crate) fn report_outcome(logger: &dyn BootLogger, args: &str, outcome: &CommandOutcome) {
    if outcome.is_success() {
        return;
    }

    match outcome.message() {
        Some(message) => logger.stderr(&format!("Error running command '{}': {}", args, message)),
        None => logger.stderr(&format!("Error running command '{}'", args)),
    }

    if let Some(cause) = outcome.cause() {
        logger.stderr_with("Command exception", cause);
    }
}
