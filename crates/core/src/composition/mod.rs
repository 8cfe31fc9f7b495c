pub mod engine;
pub mod layer;

pub use engine::*;
pub use layer::*;
