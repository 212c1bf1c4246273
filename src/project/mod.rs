//! Project-side collaborators of metadata resolution.
//!
//! - [`DependencyMetaDataProvider`] reports the current [`Module`] of the project
//! - [`ProjectFinder`] looks up project state by path; a module may resolve outside
//!   any project, in which case no schema and a no-op locking provider are used
//! - [`configuration`] holds the configuration registry
//! - [`locking`] holds dependency-locking providers

pub mod configuration;
pub mod locking;

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use crate::identity::Module;
use locking::DependencyLockingProvider;

pub use configuration::{
    Configuration, ConfigurationContainer, ConfigurationsProvider, DependencyDeclaration,
    DependencyTarget, NamedConfigurationsProvider, PublishArtifact, ResolutionStrategy,
};
pub use locking::{
    DependencyLockingState, InMemoryLockingProvider, NoOpDependencyLockingProvider,
};

/// Reports the module the project currently publishes as.
pub trait DependencyMetaDataProvider: Send + Sync {
    /// Current module coordinates and status.
    fn module(&self) -> Module;
}

/// The project's own coordinates, which build logic may change between resolutions.
#[derive(Debug)]
pub struct ProjectIdentity {
    module: RwLock<Module>,
}

impl ProjectIdentity {
    /// Start with `module`.
    pub fn new(module: Module) -> Self {
        Self {
            module: RwLock::new(module),
        }
    }

    /// Replace the module coordinates.
    pub fn set_module(&self, module: Module) {
        *self.module.write().unwrap_or_else(PoisonError::into_inner) = module;
    }
}

impl DependencyMetaDataProvider for ProjectIdentity {
    fn module(&self) -> Module {
        self.module.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Declared attributes of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributesSchema {
    attributes: BTreeSet<String>,
}

impl AttributesSchema {
    /// An empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style declaration of an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.insert(name.into());
        self
    }

    /// Whether `name` is declared.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Declared attribute names, sorted.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(String::as_str)
    }
}

/// What the metadata core needs from a project.
#[derive(Debug)]
pub struct ProjectState {
    /// Project path (e.g., ":app")
    pub path: String,
    /// The project's attribute schema
    pub attributes_schema: Arc<AttributesSchema>,
    /// The project's dependency-locking provider
    pub dependency_locking: Arc<dyn DependencyLockingProvider>,
}

impl ProjectState {
    /// A project with an empty schema and no locking.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            attributes_schema: Arc::new(AttributesSchema::new()),
            dependency_locking: NoOpDependencyLockingProvider::instance(),
        }
    }

    /// Replace the attribute schema.
    #[must_use]
    pub fn with_schema(mut self, schema: AttributesSchema) -> Self {
        self.attributes_schema = Arc::new(schema);
        self
    }

    /// Replace the dependency-locking provider.
    #[must_use]
    pub fn with_locking(mut self, provider: Arc<dyn DependencyLockingProvider>) -> Self {
        self.dependency_locking = provider;
        self
    }
}

/// Looks up projects by path.
pub trait ProjectFinder: Send + Sync {
    /// The project at `path`, if it belongs to this build.
    fn find_project(&self, path: &str) -> Option<Arc<ProjectState>>;
}

/// Projects of a build, keyed by path.
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    projects: HashMap<String, Arc<ProjectState>>,
}

impl ProjectRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `project`, replacing any project with the same path.
    pub fn register(&mut self, project: ProjectState) -> Arc<ProjectState> {
        let project = Arc::new(project);
        self.projects.insert(project.path.clone(), Arc::clone(&project));
        project
    }
}

impl ProjectFinder for ProjectRegistry {
    fn find_project(&self, path: &str) -> Option<Arc<ProjectState>> {
        self.projects.get(path).cloned()
    }
}
