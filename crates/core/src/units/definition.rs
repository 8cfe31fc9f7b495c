use crate::container::Binder;
use crate::errors::ConstructionError;
use std::any::TypeId;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Identity of a configuration unit: the concrete Rust type that implements it
#[derive(Debug, Clone, Copy)]
pub struct UnitTypeId {
    id: TypeId,
    name: &'static str,
}

impl UnitTypeId {
    pub fn of<M: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<M>(),
            name: std::any::type_name::<M>(),
        }
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path, used in diagnostics
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for UnitTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UnitTypeId {}

impl Hash for UnitTypeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for UnitTypeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UnitTypeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(other.name).then_with(|| self.id.cmp(&other.id))
    }
}

impl std::fmt::Display for UnitTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// An opaque bundle of bindings contributed to the construction container.
///
/// The composition engine never looks inside a unit; it only groups units by
/// [`UnitTypeId`] and orders them. The container calls [`ConfigUnit::configure`]
/// once per unit when the service graph is built.
pub trait ConfigUnit: Send + Sync + 'static {
    /// Contribute bindings, commands and options
    fn configure(&self, binder: &mut Binder) -> Result<(), ConstructionError>;

    /// Identity of this unit for grouping and override matching
    fn unit_type(&self) -> UnitTypeId {
        UnitTypeId::of::<Self>()
    }
}

impl std::fmt::Debug for dyn ConfigUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigUnit")
            .field("unit_type", &self.unit_type().name())
            .finish()
    }
}
