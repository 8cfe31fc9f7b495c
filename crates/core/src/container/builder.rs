use crate::command::{Command, OptionSpec};
use crate::container::binder::{Binder, Binding, BindingKey, Contribution};
use crate::container::{Container, ShutdownHook, ShutdownManager};
use crate::errors::{ConstructionError, ConstructionErrorKind};
use crate::units::UnitTypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Accumulates fully overridden layers and builds the container.
///
/// Layers are independent: an equal key contributed by two different units
/// in two layers is an error. The same unit showing up in several layers
/// (a unit overriding units of separate layers) only counts once.
pub struct ContainerBuilder {
    bindings: HashMap<BindingKey, Binding>,
    commands: Vec<Contribution<Arc<dyn Command>>>,
    options: Vec<Contribution<OptionSpec>>,
    default_command: Option<Contribution<String>>,
    shutdown_hooks: Vec<(String, ShutdownHook)>,
    layer_count: usize,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            commands: Vec::new(),
            options: Vec::new(),
            default_command: None,
            shutdown_hooks: Vec::new(),
            layer_count: 0,
        }
    }

    /// Add the merged contributions of one composition layer
    pub fn add_layer(&mut self, layer: Binder) -> Result<(), ConstructionError> {
        let Binder {
            mut bindings,
            order,
            commands,
            options,
            default_command,
            shutdown_hooks,
            ..
        } = layer;

        for key in order {
            let Some(binding) = bindings.remove(&key) else {
                continue;
            };
            match self.bindings.get(&key) {
                Some(existing) if existing.origin == binding.origin => {}
                Some(existing) => {
                    return Err(duplicate(
                        &format!("binding {}", key),
                        existing.origin,
                        binding.origin,
                    ))
                }
                None => {
                    self.bindings.insert(key, binding);
                }
            }
        }

        for command in commands {
            let name = command.value.metadata().name().to_string();
            match self
                .commands
                .iter()
                .find(|existing| existing.value.metadata().name() == name)
            {
                Some(existing) if existing.origin == command.origin => {}
                Some(existing) => {
                    return Err(duplicate(
                        &format!("command '{}'", name),
                        existing.origin,
                        command.origin,
                    ))
                }
                None => self.commands.push(command),
            }
        }

        for option in options {
            match self
                .options
                .iter()
                .find(|existing| existing.value.name() == option.value.name())
            {
                Some(existing) if existing.origin == option.origin => {}
                Some(existing) => {
                    return Err(duplicate(
                        &format!("option '{}'", option.value.name()),
                        existing.origin,
                        option.origin,
                    ))
                }
                None => self.options.push(option),
            }
        }

        if let Some(default_command) = default_command {
            match &self.default_command {
                Some(existing) if existing.origin == default_command.origin => {}
                Some(existing) => {
                    return Err(duplicate(
                        "default command",
                        existing.origin,
                        default_command.origin,
                    ))
                }
                None => self.default_command = Some(default_command),
            }
        }

        self.shutdown_hooks.extend(shutdown_hooks);
        self.layer_count += 1;
        Ok(())
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Build the container
    pub fn build(self) -> Container {
        Container::new(
            self.bindings,
            self.commands.into_iter().map(|c| c.value).collect(),
            self.options.into_iter().map(|o| o.value).collect(),
            self.default_command.map(|d| d.value),
            Arc::new(ShutdownManager::with_hooks(self.shutdown_hooks)),
        )
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate(what: &str, first: UnitTypeId, second: UnitTypeId) -> ConstructionError {
    ConstructionError::new(
        ConstructionErrorKind::DuplicateBinding,
        format!(
            "{} is contributed by both '{}' and '{}'; declare an override to replace it",
            what, first, second
        ),
    )
}
