pub mod clock;
pub mod greeting;

pub use clock::ClockUnit;
pub use greeting::GreetingUnit;

use strata_core::StaticRegistry;

/// Units linked into the launcher and picked up by auto-loading
pub fn registry() -> StaticRegistry {
    StaticRegistry::new().with(ClockUnit::provider)
}
