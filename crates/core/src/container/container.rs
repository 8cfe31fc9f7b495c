use crate::command::{Command, OptionSpec};
use crate::container::binder::{AnyValue, Binding, BindingKey, BindingValue};
use crate::container::ShutdownManager;
use crate::errors::{ConstructionError, ConstructionErrorKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Live service graph built from a resolved composition
pub struct Container {
    bindings: HashMap<BindingKey, Binding>,
    commands: Vec<Arc<dyn Command>>,
    options: Vec<OptionSpec>,
    default_command: Option<String>,
    shutdown: Arc<ShutdownManager>,
    resolving: Mutex<Vec<BindingKey>>,
}

impl Container {
    pub(crate) fn new(
        bindings: HashMap<BindingKey, Binding>,
        commands: Vec<Arc<dyn Command>>,
        options: Vec<OptionSpec>,
        default_command: Option<String>,
        shutdown: Arc<ShutdownManager>,
    ) -> Self {
        Self {
            bindings,
            commands,
            options,
            default_command,
            shutdown,
            resolving: Mutex::new(Vec::new()),
        }
    }

    /// Resolve a service bound by type
    pub fn resolve<T>(&self) -> Result<T, ConstructionError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.resolve_key(&BindingKey::of::<T>())
    }

    /// Resolve a service bound under a qualifier
    pub fn resolve_named<T>(&self, qualifier: &str) -> Result<T, ConstructionError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.resolve_key(&BindingKey::named::<T>(qualifier))
    }

    /// Try to resolve a service, returning None if it is not bound
    pub fn try_resolve<T>(&self) -> Result<Option<T>, ConstructionError>
    where
        T: Clone + Send + Sync + 'static,
    {
        if self.contains::<T>() {
            self.resolve::<T>().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Check if a type is bound
    pub fn contains<T: 'static>(&self) -> bool {
        self.bindings.contains_key(&BindingKey::of::<T>())
    }

    /// Get the number of bindings
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// All contributed commands, in contribution order
    pub fn commands(&self) -> &[Arc<dyn Command>] {
        &self.commands
    }

    pub fn command(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands
            .iter()
            .find(|command| command.metadata().name() == name)
            .cloned()
    }

    /// All contributed options, in contribution order
    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn default_command(&self) -> Option<&str> {
        self.default_command.as_deref()
    }

    pub fn shutdown_manager(&self) -> Arc<ShutdownManager> {
        Arc::clone(&self.shutdown)
    }

    fn resolve_key<T>(&self, key: &BindingKey) -> Result<T, ConstructionError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let binding = self
            .bindings
            .get(key)
            .ok_or_else(|| ConstructionError::missing_binding(key))?;

        let value = match &binding.value {
            BindingValue::Instance(value) => Arc::clone(value),
            BindingValue::Singleton { factory, cell } => match cell.get() {
                Some(value) => Arc::clone(value),
                None => {
                    self.enter(key)?;
                    let produced = factory(self);
                    self.leave(key)?;
                    let produced = produced?;
                    // a re-entrant call may have filled the cell first; keep that instance
                    let _ = cell.set(produced);
                    cell.get().cloned().ok_or_else(|| {
                        ConstructionError::new(
                            ConstructionErrorKind::Provision,
                            format!("Singleton {} was not retained", key),
                        )
                    })?
                }
            },
        };

        downcast(key, value)
    }

    fn enter(&self, key: &BindingKey) -> Result<(), ConstructionError> {
        let mut resolving = self.resolving.lock().map_err(|_| lock_error())?;
        if let Some(position) = resolving.iter().position(|k| k == key) {
            let path: Vec<String> = resolving[position..]
                .iter()
                .chain(std::iter::once(key))
                .map(|k| k.to_string())
                .collect();
            return Err(ConstructionError::new(
                ConstructionErrorKind::CircularDependency,
                format!("Circular dependency: {}", path.join(" -> ")),
            ));
        }
        resolving.push(key.clone());
        Ok(())
    }

    fn leave(&self, key: &BindingKey) -> Result<(), ConstructionError> {
        let mut resolving = self.resolving.lock().map_err(|_| lock_error())?;
        if let Some(position) = resolving.iter().rposition(|k| k == key) {
            resolving.remove(position);
        }
        Ok(())
    }
}

fn downcast<T>(key: &BindingKey, value: AnyValue) -> Result<T, ConstructionError>
where
    T: Clone + Send + Sync + 'static,
{
    value.downcast_ref::<T>().cloned().ok_or_else(|| {
        ConstructionError::new(
            ConstructionErrorKind::Provision,
            format!("Binding for {} holds a value of another type", key),
        )
    })
}

fn lock_error() -> ConstructionError {
    ConstructionError::new(
        ConstructionErrorKind::Provision,
        "Lock error on resource: container resolution stack",
    )
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("binding_count", &self.bindings.len())
            .field("command_count", &self.commands.len())
            .field("default_command", &self.default_command)
            .finish()
    }
}
