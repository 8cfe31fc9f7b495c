pub mod boot_config;
pub mod configuration;
pub mod error;

pub use boot_config::*;
pub use configuration::*;
pub use error::*;
