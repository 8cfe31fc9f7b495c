//! End-to-end behavior of `Bootstrap`: composition, construction and command execution.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use strata_core::command::{CommandContext, CommandMetadata, CommandOutcome};
use strata_core::errors::BoxError;
use strata_core::{
    Binder, BootError, Bootstrap, Command, CommandExecutionError, ConfigUnit, ConfigUnitProvider,
    Configuration, ConstructionError, ConstructionErrorKind, CoreUnit, MemoryBootLogger,
    StaticRegistry, UnitTypeId,
};

#[derive(Debug, Clone, PartialEq)]
struct DataSource(&'static str);

struct EchoCommand {
    name: &'static str,
}

impl Command for EchoCommand {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new(self.name)
    }

    fn run(&self, context: &CommandContext<'_>) -> Result<CommandOutcome, CommandExecutionError> {
        context.boot_logger()?.stdout(self.name);
        Ok(CommandOutcome::ok())
    }
}

#[derive(Default)]
struct PingUnit;

impl ConfigUnit for PingUnit {
    fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
        binder.add_command(EchoCommand { name: "ping" });
        Ok(())
    }
}

#[derive(Default)]
struct JdbcUnit;

impl ConfigUnit for JdbcUnit {
    fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
        binder.bind(DataSource("prod")).bind_named("pool", 8usize);
        Ok(())
    }
}

#[derive(Default)]
struct JdbcTestUnit;

impl ConfigUnit for JdbcTestUnit {
    fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
        binder.bind(DataSource("test"));
        Ok(())
    }
}

fn memory_app<const N: usize>(args: [&str; N]) -> (Bootstrap, MemoryBootLogger) {
    let logger = MemoryBootLogger::new().with_trace();
    let bootstrap = Bootstrap::app(args).boot_logger(Arc::new(logger.clone()));
    (bootstrap, logger)
}

#[test]
fn test_core_only_application_runs_help() {
    let (bootstrap, logger) = memory_app(["--help"]);
    let runtime = bootstrap.create_runtime().unwrap();

    let layers = runtime.resolution().composition().layers();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].base().provider(), "CoreUnit");
    assert!(layers[0].override_chain().is_empty());

    let outcome = runtime.run();
    assert!(outcome.is_success());
    assert_eq!(outcome.exit_code(), 0);
    assert!(logger.stdout_lines()[0].contains("--config <yaml_location>"));
}

#[test]
fn test_same_type_producers_abort_startup() {
    let (bootstrap, logger) = memory_app([]);
    let outcome = bootstrap
        .provider(ConfigUnitProvider::of::<JdbcUnit>().named("P1"))
        .provider(ConfigUnitProvider::of::<JdbcUnit>().named("P2"))
        .exec();

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(
        logger.stderr_lines(),
        vec![
            "Error running command ''".to_string(),
            "Command exception".to_string(),
            "Caused by: Composition conflict: providers [P1, P2] all produce 'JdbcUnit' and none of them overrides it".to_string(),
        ]
    );
}

#[test]
fn test_override_replaces_equal_bindings_only() {
    let (bootstrap, logger) = memory_app([]);
    let runtime = bootstrap
        .unit_type::<JdbcUnit>()
        .override_unit::<JdbcUnit>()
        .with_factory(|| JdbcTestUnit)
        .create_runtime()
        .unwrap();

    assert_eq!(runtime.service::<DataSource>().unwrap(), DataSource("test"));
    assert_eq!(runtime.container().resolve_named::<usize>("pool").unwrap(), 8);
    assert_eq!(
        runtime.resolution().diagnostics(),
        vec!["JdbcTestUnit overrides JdbcUnit's JdbcUnit".to_string()]
    );
    assert_eq!(logger.trace_lines(), runtime.resolution().diagnostics());
}

#[test]
fn test_mutual_overrides_are_a_cycle() {
    let error = Bootstrap::app(Vec::<String>::new())
        .boot_logger(Arc::new(MemoryBootLogger::new()))
        .override_unit::<JdbcTestUnit>()
        .with_factory(|| JdbcUnit)
        .override_unit::<JdbcUnit>()
        .with_factory(|| JdbcTestUnit)
        .create_runtime()
        .unwrap_err();

    assert!(error.is_cycle());
    assert_eq!(
        error.to_string(),
        "Override cycle detected: JdbcTestUnit -> JdbcUnit -> JdbcTestUnit"
    );
}

#[test]
fn test_failing_producer_aborts_before_any_diagnostics() {
    let (bootstrap, logger) = memory_app([]);
    let outcome = bootstrap
        .unit_type::<JdbcUnit>()
        .override_unit::<JdbcUnit>()
        .with_factory(|| JdbcTestUnit)
        .try_unit_factory("broken", || -> Result<PingUnit, BoxError> {
            Err("database unreachable".into())
        })
        .exec();

    assert!(!outcome.is_success());
    assert!(logger.trace_lines().is_empty());
    match outcome.cause().and_then(|c| c.downcast_ref::<BootError>()) {
        Some(BootError::ProviderInstantiation { provider, .. }) => assert_eq!(provider, "broken"),
        other => panic!("unexpected cause: {:?}", other),
    }
}

#[test]
fn test_core_unit_can_be_overridden() {
    struct DefaultPing;

    impl ConfigUnit for DefaultPing {
        fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
            binder.set_default_command("ping");
            Ok(())
        }
    }

    let (bootstrap, logger) = memory_app([]);
    let outcome = bootstrap
        .unit_type::<PingUnit>()
        .override_unit::<CoreUnit>()
        .with_unit(DefaultPing)
        .exec();

    assert!(outcome.is_success());
    assert_eq!(logger.stdout_lines(), vec!["ping".to_string()]);
    assert_eq!(
        logger.trace_lines(),
        vec!["Bootstrap overrides CoreUnit's CoreUnit".to_string()]
    );
}

#[test]
fn test_malformed_options_report_the_parser_message() {
    let (bootstrap, logger) = memory_app(["--nope"]);
    let outcome = bootstrap.exec();

    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.cause().is_none());
    let message = outcome.message().unwrap_or_default();
    assert!(message.contains("unexpected argument '--nope'"), "{}", message);
    assert!(logger.stderr_lines()[0].starts_with("Error running command '--nope': "));
}

#[test]
fn test_several_commands_on_the_command_line_fail() {
    let (bootstrap, _) = memory_app(["--ping", "--help"]);
    let outcome = bootstrap.unit_type::<PingUnit>().exec();

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(
        outcome.message(),
        Some("CLI options match multiple commands: help, ping")
    );
}

#[test]
fn test_failing_command_is_reported_with_its_cause() {
    struct FailCommand;

    impl Command for FailCommand {
        fn metadata(&self) -> CommandMetadata {
            CommandMetadata::new("fail")
        }

        fn run(&self, _: &CommandContext<'_>) -> Result<CommandOutcome, CommandExecutionError> {
            Err(CommandExecutionError::new("fail", "disk full"))
        }
    }

    struct FailUnit;

    impl ConfigUnit for FailUnit {
        fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
            binder.add_command(FailCommand);
            Ok(())
        }
    }

    let (bootstrap, logger) = memory_app(["--fail"]);
    let outcome = bootstrap.unit(FailUnit).exec();

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(
        logger.stderr_lines(),
        vec![
            "Error running command '--fail'".to_string(),
            "Command exception".to_string(),
            "Caused by: Command 'fail' failed: disk full".to_string(),
        ]
    );
}

#[test]
fn test_unrelated_units_binding_the_same_key_fail_construction() {
    let error = Bootstrap::app(Vec::<String>::new())
        .boot_logger(Arc::new(MemoryBootLogger::new()))
        .unit_type::<JdbcUnit>()
        .unit_type::<JdbcTestUnit>()
        .create_runtime()
        .unwrap_err();

    match error {
        BootError::Construction(e) => assert_eq!(e.kind(), ConstructionErrorKind::DuplicateBinding),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_shutdown_hooks_run_once_after_exec() {
    struct PoolUnit(Arc<AtomicUsize>);

    impl ConfigUnit for PoolUnit {
        fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
            let closed = Arc::clone(&self.0);
            binder.on_shutdown("pool", move || {
                closed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        }
    }

    let closed = Arc::new(AtomicUsize::new(0));
    let (bootstrap, _) = memory_app(["--help"]);
    let outcome = bootstrap.unit(PoolUnit(Arc::clone(&closed))).exec();

    assert!(outcome.is_success());
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unit_overriding_two_layers_is_configured_and_released_once() {
    struct TestDatabaseUnit {
        configured: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
    }

    impl ConfigUnit for TestDatabaseUnit {
        fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
            self.configured.fetch_add(1, Ordering::SeqCst);
            let released = Arc::clone(&self.released);
            binder.bind(DataSource("test"));
            binder.on_shutdown("test-database", move || {
                released.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        }
    }

    let configured = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicUsize::new(0));
    let (bootstrap, logger) = memory_app(["--help"]);
    let runtime = bootstrap
        .unit_type::<JdbcUnit>()
        .unit_type::<PingUnit>()
        .override_units([UnitTypeId::of::<JdbcUnit>(), UnitTypeId::of::<PingUnit>()])
        .with_unit(TestDatabaseUnit {
            configured: Arc::clone(&configured),
            released: Arc::clone(&released),
        })
        .create_runtime()
        .unwrap();

    assert_eq!(
        logger.trace_lines(),
        vec![
            "Bootstrap overrides JdbcUnit's JdbcUnit".to_string(),
            "Bootstrap overrides PingUnit's PingUnit".to_string(),
        ]
    );
    assert_eq!(configured.load(Ordering::SeqCst), 1);
    assert_eq!(runtime.service::<DataSource>().unwrap(), DataSource("test"));
    assert_eq!(runtime.container().resolve_named::<usize>("pool").unwrap(), 8);

    runtime.register_shutdown_hook();
    assert!(runtime.run().is_success());
    drop(runtime);

    assert_eq!(configured.load(Ordering::SeqCst), 1);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_yaml_configuration_is_merged_from_config_options() {
    struct ShowCommand;

    impl Command for ShowCommand {
        fn metadata(&self) -> CommandMetadata {
            CommandMetadata::new("show")
        }

        fn run(
            &self,
            context: &CommandContext<'_>,
        ) -> Result<CommandOutcome, CommandExecutionError> {
            let config: Configuration = context.resolve()?;
            let port: u16 = config
                .get("server.port")
                .map_err(|e| CommandExecutionError::new("show", e.to_string()))?;
            context.boot_logger()?.stdout(&port.to_string());
            Ok(CommandOutcome::ok())
        }
    }

    struct ShowUnit;

    impl ConfigUnit for ShowUnit {
        fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError> {
            binder.add_command(ShowCommand);
            Ok(())
        }
    }

    let mut base = tempfile::NamedTempFile::new().unwrap();
    base.write_all(b"server:\n  host: localhost\n  port: 8080\n").unwrap();
    let mut local = tempfile::NamedTempFile::new().unwrap();
    local.write_all(b"server:\n  port: 9090\n").unwrap();
    let base_path = base.path().display().to_string();
    let local_path = local.path().display().to_string();

    let (bootstrap, logger) = memory_app(["--show"]);
    let outcome = bootstrap
        .args(["--config", base_path.as_str(), "--config", local_path.as_str()])
        .unit(ShowUnit)
        .exec();

    assert!(outcome.is_success());
    assert_eq!(logger.stdout_lines(), vec!["9090".to_string()]);

    let (bootstrap, _) = memory_app(["--show", "--config", "/no/such/config.yml"]);
    let outcome = bootstrap.unit(ShowUnit).exec();
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.cause().is_some());
}

#[test]
fn test_plugin_registry_is_only_consulted_when_auto_loading() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let registry = move || {
        counter.fetch_add(1, Ordering::SeqCst);
        vec![ConfigUnitProvider::of::<PingUnit>()]
    };

    let runtime = Bootstrap::app(Vec::<String>::new())
        .boot_logger(Arc::new(MemoryBootLogger::new()))
        .plugin_registry(registry.clone())
        .create_runtime()
        .unwrap();
    assert_eq!(runtime.resolution().composition().len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let runtime = Bootstrap::app(["--ping"])
        .boot_logger(Arc::new(MemoryBootLogger::new()))
        .plugin_registry(registry)
        .plugin_registry(StaticRegistry::new())
        .auto_load_units()
        .create_runtime()
        .unwrap();
    assert_eq!(runtime.resolution().composition().len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(runtime.run().is_success());
}
