use crate::command::{Command, OptionSpec};
use crate::container::{Container, ShutdownHook};
use crate::errors::{BoxError, ConstructionError};
use crate::units::UnitTypeId;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

pub(crate) type AnyValue = Arc<dyn Any + Send + Sync>;

pub(crate) type SingletonFactory =
    Arc<dyn Fn(&Container) -> Result<AnyValue, ConstructionError> + Send + Sync>;

/// Key of a binding: the bound type plus an optional qualifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingKey {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<String>,
}

impl BindingKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifier: None,
        }
    }

    pub fn named<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            ..Self::of::<T>()
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

impl std::fmt::Display for BindingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}@{}", self.type_name, qualifier),
            None => write!(f, "{}", self.type_name),
        }
    }
}

pub(crate) enum BindingValue {
    Instance(AnyValue),
    Singleton {
        factory: SingletonFactory,
        cell: OnceLock<AnyValue>,
    },
}

/// One binding together with the unit that contributed it
pub(crate) struct Binding {
    pub(crate) value: BindingValue,
    pub(crate) origin: UnitTypeId,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match &self.value {
            BindingValue::Instance(_) => "<instance>",
            BindingValue::Singleton { .. } => "<singleton>",
        };
        f.debug_struct("Binding")
            .field("value", &value)
            .field("origin", &self.origin.name())
            .finish()
    }
}

pub(crate) struct Contribution<T> {
    pub(crate) value: T,
    pub(crate) origin: UnitTypeId,
}

/// Collects everything a single configuration unit contributes to the container
pub struct Binder {
    origin: UnitTypeId,
    pub(crate) bindings: HashMap<BindingKey, Binding>,
    pub(crate) order: Vec<BindingKey>,
    pub(crate) commands: Vec<Contribution<Arc<dyn Command>>>,
    pub(crate) options: Vec<Contribution<OptionSpec>>,
    pub(crate) default_command: Option<Contribution<String>>,
    pub(crate) shutdown_hooks: Vec<(String, ShutdownHook)>,
}

impl Binder {
    pub fn new(origin: UnitTypeId) -> Self {
        Self {
            origin,
            bindings: HashMap::new(),
            order: Vec::new(),
            commands: Vec::new(),
            options: Vec::new(),
            default_command: None,
            shutdown_hooks: Vec::new(),
        }
    }

    /// Unit these contributions come from
    pub fn origin(&self) -> UnitTypeId {
        self.origin
    }

    /// Bind a value; resolution hands out clones of it
    pub fn bind<T>(&mut self, value: T) -> &mut Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.insert(BindingKey::of::<T>(), BindingValue::Instance(Arc::new(value)));
        self
    }

    /// Bind a value under a qualifier
    pub fn bind_named<T>(&mut self, qualifier: impl Into<String>, value: T) -> &mut Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.insert(
            BindingKey::named::<T>(qualifier),
            BindingValue::Instance(Arc::new(value)),
        );
        self
    }

    /// Bind a lazily built singleton; the factory runs on first resolution
    pub fn bind_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, ConstructionError> + Send + Sync + 'static,
    {
        let factory: SingletonFactory =
            Arc::new(move |container| factory(container).map(|value| Arc::new(value) as AnyValue));
        self.insert(
            BindingKey::of::<T>(),
            BindingValue::Singleton {
                factory,
                cell: OnceLock::new(),
            },
        );
        self
    }

    /// Contribute a command, exposed on the command line as `--<name>`
    pub fn add_command<C: Command + 'static>(&mut self, command: C) -> &mut Self {
        self.add_shared_command(Arc::new(command))
    }

    pub fn add_shared_command(&mut self, command: Arc<dyn Command>) -> &mut Self {
        let name = command.metadata().name().to_string();
        self.commands
            .retain(|existing| existing.value.metadata().name() != name);
        self.commands.push(Contribution {
            value: command,
            origin: self.origin,
        });
        self
    }

    /// Contribute a command line option
    pub fn add_option(&mut self, option: OptionSpec) -> &mut Self {
        self.options
            .retain(|existing| existing.value.name() != option.name());
        self.options.push(Contribution {
            value: option,
            origin: self.origin,
        });
        self
    }

    /// Command to run when the command line selects none
    pub fn set_default_command(&mut self, name: impl Into<String>) -> &mut Self {
        self.default_command = Some(Contribution {
            value: name.into(),
            origin: self.origin,
        });
        self
    }

    /// Release a resource when the runtime shuts down
    pub fn on_shutdown<F>(&mut self, name: impl Into<String>, hook: F) -> &mut Self
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        self.shutdown_hooks.push((name.into(), Box::new(hook)));
        self
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.bindings.contains_key(&BindingKey::of::<T>())
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    fn insert(&mut self, key: BindingKey, value: BindingValue) {
        let binding = Binding {
            value,
            origin: self.origin,
        };
        if self.bindings.insert(key.clone(), binding).is_none() {
            self.order.push(key);
        }
    }

    /// Copy of the bindings, commands and options of this unit.
    ///
    /// Shutdown hooks stay with the original so a unit joining several
    /// layers releases its resources once.
    pub(crate) fn share_contributions(&self) -> Binder {
        let bindings = self
            .bindings
            .iter()
            .map(|(key, binding)| {
                let value = match &binding.value {
                    BindingValue::Instance(value) => BindingValue::Instance(Arc::clone(value)),
                    BindingValue::Singleton { factory, .. } => BindingValue::Singleton {
                        factory: Arc::clone(factory),
                        cell: OnceLock::new(),
                    },
                };
                let binding = Binding {
                    value,
                    origin: binding.origin,
                };
                (key.clone(), binding)
            })
            .collect();

        Binder {
            origin: self.origin,
            bindings,
            order: self.order.clone(),
            commands: self
                .commands
                .iter()
                .map(|c| Contribution {
                    value: Arc::clone(&c.value),
                    origin: c.origin,
                })
                .collect(),
            options: self
                .options
                .iter()
                .map(|o| Contribution {
                    value: o.value.clone(),
                    origin: o.origin,
                })
                .collect(),
            default_command: self.default_command.as_ref().map(|d| Contribution {
                value: d.value.clone(),
                origin: d.origin,
            }),
            shutdown_hooks: Vec::new(),
        }
    }

    /// Layer the contributions of an overriding unit on top of this one.
    ///
    /// Equal keys, command names and option names are replaced in place;
    /// everything else of the base persists.
    pub(crate) fn apply_override(&mut self, overriding: Binder) {
        let Binder {
            mut bindings,
            order,
            commands,
            options,
            default_command,
            shutdown_hooks,
            ..
        } = overriding;

        for key in order {
            if let Some(binding) = bindings.remove(&key) {
                if self.bindings.insert(key.clone(), binding).is_none() {
                    self.order.push(key);
                }
            }
        }

        for command in commands {
            let name = command.value.metadata().name().to_string();
            match self
                .commands
                .iter_mut()
                .find(|existing| existing.value.metadata().name() == name)
            {
                Some(existing) => *existing = command,
                None => self.commands.push(command),
            }
        }

        for option in options {
            match self
                .options
                .iter_mut()
                .find(|existing| existing.value.name() == option.value.name())
            {
                Some(existing) => *existing = option,
                None => self.options.push(option),
            }
        }

        if default_command.is_some() {
            self.default_command = default_command;
        }

        self.shutdown_hooks.extend(shutdown_hooks);
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("origin", &self.origin.name())
            .field("binding_count", &self.bindings.len())
            .field("command_count", &self.commands.len())
            .field("option_count", &self.options.len())
            .finish()
    }
}
