pub mod definition;
pub mod provider;
pub mod registry;

pub use definition::*;
pub use provider::*;
pub use registry::*;
