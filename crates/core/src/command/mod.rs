#[allow(clippy::module_inception)]
pub mod command;
pub mod options;
pub mod outcome;
pub mod runner;

pub use command::*;
pub use options::*;
pub use outcome::*;
pub use runner::*;
