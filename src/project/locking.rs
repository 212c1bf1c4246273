//! Dependency-locking providers.
//!
//! The root metadata only carries a reference to the provider selected for the project
//! and asks it for the lock state of configurations that enable locking. When resolution
//! happens outside any project, the shared [`NoOpDependencyLockingProvider`] is used.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::identity::ModuleVersionIdentifier;

/// Lock state of one configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyLockingState {
    /// Whether resolution must be validated against the locked versions
    pub must_validate: bool,
    /// The locked module versions
    pub locked: Vec<ModuleVersionIdentifier>,
}

/// Supplies lock state per configuration.
pub trait DependencyLockingProvider: Send + Sync + fmt::Debug {
    /// Lock state for the configuration named `configuration`.
    fn load_lock_state(&self, configuration: &str) -> DependencyLockingState;
}

/// Provider used when no project context exists: nothing is ever locked.
#[derive(Debug, Default)]
pub struct NoOpDependencyLockingProvider;

static NO_OP: LazyLock<Arc<dyn DependencyLockingProvider>> =
    LazyLock::new(|| Arc::new(NoOpDependencyLockingProvider));

impl NoOpDependencyLockingProvider {
    /// The shared instance.
    pub fn instance() -> Arc<dyn DependencyLockingProvider> {
        Arc::clone(&NO_OP)
    }
}

impl DependencyLockingProvider for NoOpDependencyLockingProvider {
    fn load_lock_state(&self, _configuration: &str) -> DependencyLockingState {
        DependencyLockingState::default()
    }
}

/// Lock states held in memory, typically loaded from the `[locks]` descriptor table.
#[derive(Debug, Default)]
pub struct InMemoryLockingProvider {
    states: HashMap<String, Vec<ModuleVersionIdentifier>>,
}

impl InMemoryLockingProvider {
    /// Create a provider with no locked configurations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `configuration` to `versions`.
    pub fn lock(&mut self, configuration: impl Into<String>, versions: Vec<ModuleVersionIdentifier>) {
        self.states.insert(configuration.into(), versions);
    }
}

impl DependencyLockingProvider for InMemoryLockingProvider {
    fn load_lock_state(&self, configuration: &str) -> DependencyLockingState {
        match self.states.get(configuration) {
            Some(locked) => DependencyLockingState {
                must_validate: true,
                locked: locked.clone(),
            },
            None => DependencyLockingState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_op_is_shared() {
        let a = NoOpDependencyLockingProvider::instance();
        let b = NoOpDependencyLockingProvider::instance();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.load_lock_state("runtime"), DependencyLockingState::default());
    }

    #[test]
    fn test_in_memory_state() {
        let mut provider = InMemoryLockingProvider::new();
        provider.lock("runtime", vec![ModuleVersionIdentifier::new("g", "n", "1")]);

        let state = provider.load_lock_state("runtime");
        assert!(state.must_validate);
        assert_eq!(state.locked.len(), 1);
        assert!(!provider.load_lock_state("other").must_validate);
    }
}
