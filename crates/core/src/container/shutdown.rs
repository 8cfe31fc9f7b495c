use crate::errors::BoxError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Resource release callback run once when the runtime shuts down
pub type ShutdownHook = Box<dyn FnOnce() -> Result<(), BoxError> + Send>;

/// Runs registered release callbacks, newest first, at most once
pub struct ShutdownManager {
    hooks: Mutex<Vec<(String, ShutdownHook)>>,
    completed: AtomicBool,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
            completed: AtomicBool::new(false),
        }
    }

    pub(crate) fn with_hooks(hooks: Vec<(String, ShutdownHook)>) -> Self {
        Self {
            hooks: Mutex::new(hooks),
            completed: AtomicBool::new(false),
        }
    }

    /// Register a callback; ignored once shutdown has completed
    pub fn add<F>(&self, name: impl Into<String>, hook: F)
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        let name = name.into();
        if self.is_completed() {
            tracing::warn!("Shutdown already completed, dropping hook '{}'", name);
            return;
        }
        match self.hooks.lock() {
            Ok(mut hooks) => hooks.push((name, Box::new(hook))),
            Err(_) => tracing::warn!("Shutdown hook registry poisoned, dropping hook '{}'", name),
        }
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.lock().map(|hooks| hooks.len()).unwrap_or(0)
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    /// Run every callback in reverse registration order.
    ///
    /// Returns the number of callbacks that failed; failures are logged and
    /// do not stop the remaining callbacks.
    pub fn shutdown(&self) -> usize {
        if self.completed.swap(true, Ordering::SeqCst) {
            return 0;
        }

        let hooks = match self.hooks.lock() {
            Ok(mut hooks) => std::mem::take(&mut *hooks),
            Err(_) => {
                tracing::warn!("Shutdown hook registry poisoned, skipping release");
                return 0;
            }
        };

        let mut failures = 0;
        for (name, hook) in hooks.into_iter().rev() {
            tracing::debug!("Running shutdown hook: {}", name);
            if let Err(e) = hook() {
                failures += 1;
                tracing::warn!("Shutdown hook '{}' failed: {}", name, e);
            }
        }
        failures
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShutdownManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownManager")
            .field("hook_count", &self.hook_count())
            .field("completed", &self.is_completed())
            .finish()
    }
}
