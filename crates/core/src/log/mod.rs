pub mod boot_logger;

pub use boot_logger::{BootLine, BootLogger, BootStream, DefaultBootLogger, MemoryBootLogger};
