use crate::errors::{BootError, BoxError};
use crate::units::{ConfigUnit, UnitTypeId};
use std::sync::Arc;

/// Factory producing a fresh unit on demand
pub type UnitFactory = Arc<dyn Fn() -> Result<Arc<dyn ConfigUnit>, BoxError> + Send + Sync>;

/// How a provider obtains its unit
#[derive(Clone)]
pub enum ProviderKind {
    /// Runs the factory each time the unit is requested
    Factory(UnitFactory),
    /// Hands out a pre-built unit
    Instance(Arc<dyn ConfigUnit>),
    /// Another provider plus the unit types it overrides
    Override {
        inner: Box<ConfigUnitProvider>,
        overrides: Vec<UnitTypeId>,
    },
}

/// Named source of exactly one configuration unit
#[derive(Clone)]
pub struct ConfigUnitProvider {
    name: String,
    unit_type: UnitTypeId,
    kind: ProviderKind,
}

impl ConfigUnitProvider {
    /// Provider running an infallible factory, named after the unit type
    pub fn factory<M, F>(factory: F) -> Self
    where
        M: ConfigUnit,
        F: Fn() -> M + Send + Sync + 'static,
    {
        let unit_type = UnitTypeId::of::<M>();
        Self {
            name: unit_type.short_name().to_string(),
            unit_type,
            kind: ProviderKind::Factory(Arc::new(move || {
                Ok(Arc::new(factory()) as Arc<dyn ConfigUnit>)
            })),
        }
    }

    /// Provider running a factory that may fail
    pub fn try_factory<M, F, E>(factory: F) -> Self
    where
        M: ConfigUnit,
        F: Fn() -> Result<M, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let unit_type = UnitTypeId::of::<M>();
        Self {
            name: unit_type.short_name().to_string(),
            unit_type,
            kind: ProviderKind::Factory(Arc::new(move || {
                factory()
                    .map(|unit| Arc::new(unit) as Arc<dyn ConfigUnit>)
                    .map_err(Into::into)
            })),
        }
    }

    /// Provider building the unit through its `Default` impl
    pub fn of<M>() -> Self
    where
        M: ConfigUnit + Default,
    {
        Self::factory(M::default)
    }

    /// Provider wrapping an existing unit instance
    pub fn instance<M: ConfigUnit>(name: impl Into<String>, unit: M) -> Self {
        Self {
            name: name.into(),
            unit_type: UnitTypeId::of::<M>(),
            kind: ProviderKind::Instance(Arc::new(unit)),
        }
    }

    /// Provider wrapping a shared, type-erased unit
    pub fn shared(name: impl Into<String>, unit: Arc<dyn ConfigUnit>) -> Self {
        Self {
            name: name.into(),
            unit_type: unit.unit_type(),
            kind: ProviderKind::Instance(unit),
        }
    }

    /// Rename the provider
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declare the unit types this provider's unit overrides
    pub fn overriding<I>(self, targets: I) -> Self
    where
        I: IntoIterator<Item = UnitTypeId>,
    {
        let mut overrides: Vec<UnitTypeId> = Vec::new();
        for target in targets {
            if !overrides.contains(&target) {
                overrides.push(target);
            }
        }

        Self {
            name: self.name.clone(),
            unit_type: self.unit_type,
            kind: ProviderKind::Override {
                inner: Box::new(self),
                overrides,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the unit this provider produces
    pub fn unit_type(&self) -> UnitTypeId {
        self.unit_type
    }

    pub fn kind(&self) -> &ProviderKind {
        &self.kind
    }

    /// Every unit type this provider overrides, nested declarations included
    pub fn overrides(&self) -> Vec<UnitTypeId> {
        match &self.kind {
            ProviderKind::Override { inner, overrides } => {
                let mut all = overrides.clone();
                for target in inner.overrides() {
                    if !all.contains(&target) {
                        all.push(target);
                    }
                }
                all
            }
            _ => Vec::new(),
        }
    }

    /// Produce the unit, wrapping any producer failure with this provider's name
    pub fn produce(&self) -> Result<Arc<dyn ConfigUnit>, BootError> {
        match &self.kind {
            ProviderKind::Factory(factory) => factory().map_err(|e| {
                BootError::instantiation(self.name.clone(), self.unit_type.short_name(), e)
            }),
            ProviderKind::Instance(unit) => Ok(Arc::clone(unit)),
            ProviderKind::Override { inner, .. } => inner.produce().map_err(|e| match e {
                BootError::ProviderInstantiation {
                    unit_type, source, ..
                } => BootError::ProviderInstantiation {
                    provider: self.name.clone(),
                    unit_type,
                    source,
                },
                other => other,
            }),
        }
    }
}

impl std::fmt::Debug for ConfigUnitProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            ProviderKind::Factory(_) => "factory",
            ProviderKind::Instance(_) => "instance",
            ProviderKind::Override { .. } => "override",
        };
        f.debug_struct("ConfigUnitProvider")
            .field("name", &self.name)
            .field("unit_type", &self.unit_type.name())
            .field("kind", &kind)
            .field("overrides", &self.overrides())
            .finish()
    }
}
