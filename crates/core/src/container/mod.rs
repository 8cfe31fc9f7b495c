#[allow(clippy::module_inception)]
pub mod container;
pub mod binder;
pub mod builder;
pub mod injector;
pub mod shutdown;

pub use container::Container;
pub use binder::{Binder, BindingKey};
pub use builder::ContainerBuilder;
pub use injector::{DefaultInjector, Injector};
pub use shutdown::{ShutdownHook, ShutdownManager};
