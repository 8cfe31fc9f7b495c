mod units;

use strata_core::{init_logging, BootConfig, Bootstrap};
use units::GreetingUnit;

fn main() {
    let boot = match BootConfig::from_env() {
        Ok(boot) => boot,
        Err(e) => {
            eprintln!("Invalid boot configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(boot.logging_config()) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    tracing::debug!("Starting strata {}", strata_core::version());

    Bootstrap::app(std::env::args().skip(1))
        .program("strata")
        .boot_logger(boot.boot_logger())
        .unit_type::<GreetingUnit>()
        .plugin_registry(units::registry())
        .auto_load_units()
        .run()
}
