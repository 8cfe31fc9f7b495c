use crate::units::ConfigUnitProvider;

/// Enumerates providers that are loaded without being registered explicitly.
///
/// Discovery order carries no meaning; the composition engine only uses it
/// to position the discovered layers after the explicit ones.
pub trait PluginRegistry: Send + Sync {
    fn discover(&self) -> Vec<ConfigUnitProvider>;
}

impl<F> PluginRegistry for F
where
    F: Fn() -> Vec<ConfigUnitProvider> + Send + Sync,
{
    fn discover(&self) -> Vec<ConfigUnitProvider> {
        self()
    }
}

/// Registry of provider entry points linked in at build time
#[derive(Debug, Default, Clone)]
pub struct StaticRegistry {
    entries: Vec<fn() -> ConfigUnitProvider>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add an entry point
    pub fn with(mut self, entry: fn() -> ConfigUnitProvider) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PluginRegistry for StaticRegistry {
    fn discover(&self) -> Vec<ConfigUnitProvider> {
        self.entries.iter().map(|entry| entry()).collect()
    }
}
