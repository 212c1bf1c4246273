//! Configurations and the registry that owns them.
//!
//! A [`Configuration`] is a named bucket of dependency declarations and published
//! artifacts. The [`ConfigurationContainer`] keeps configurations in declaration order,
//! and announces every change to its registered [`MutationValidator`]s *before* applying
//! it, so a cache listening to the container can never serve a snapshot older than the
//! change.

use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::core::{AttributeContainer, CmetaError};
use crate::identity::ModuleVersionIdentifier;
use crate::mutation::{MutationType, MutationValidator};

/// What a dependency declaration points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyTarget {
    /// An external module
    Module(ModuleVersionIdentifier),
    /// Another project of the build
    Project {
        /// Project path (e.g., ":shared")
        path: String,
    },
    /// A plain file
    File(PathBuf),
}

/// One declared dependency of a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDeclaration {
    /// Dependency target
    pub target: DependencyTarget,
    /// Attributes requested for this dependency
    pub attributes: AttributeContainer,
}

impl DependencyDeclaration {
    /// Declare a dependency on an external module.
    pub fn module(id: ModuleVersionIdentifier) -> Self {
        Self {
            target: DependencyTarget::Module(id),
            attributes: AttributeContainer::new(),
        }
    }

    /// Declare a dependency on another project.
    pub fn project(path: impl Into<String>) -> Self {
        Self {
            target: DependencyTarget::Project {
                path: path.into(),
            },
            attributes: AttributeContainer::new(),
        }
    }

    /// Declare a file dependency.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            target: DependencyTarget::File(path.into()),
            attributes: AttributeContainer::new(),
        }
    }

    /// Parse `group:name:version` or a project path (`:shared`).
    pub fn parse(notation: &str) -> Result<Self> {
        if notation.starts_with(':') {
            let id: crate::identity::ComponentIdentifier = notation.parse()?;
            if let crate::identity::ComponentIdentifier::Project {
                path,
            } = id
            {
                return Ok(Self::project(path));
            }
        }
        Ok(Self::module(notation.parse()?))
    }

    /// Notation used to address this dependency in mutations.
    pub fn notation(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            DependencyTarget::Module(id) => write!(f, "{id}"),
            DependencyTarget::Project {
                path,
            } => write!(f, "{path}"),
            DependencyTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// An artifact a configuration publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishArtifact {
    /// File name (e.g., "app.jar")
    pub name: String,
    /// Attributes of the artifact's form
    pub attributes: AttributeContainer,
}

impl PublishArtifact {
    /// Create a published artifact.
    pub fn new(name: impl Into<String>, attributes: AttributeContainer) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }
}

/// How conflicts are handled when the configuration is resolved.
///
/// Not part of root metadata: changing it never invalidates cached snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionStrategy {
    /// Fail instead of picking the newest version on conflict
    pub fail_on_version_conflict: bool,
    /// Prefer project components over external modules with the same coordinates
    pub prefer_project_modules: bool,
}

/// A named, resolvable/consumable bucket of dependencies and artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Configuration name
    pub name: String,
    /// Resolution attributes of the configuration
    pub attributes: AttributeContainer,
    /// Declared dependencies, in declaration order
    pub dependencies: Vec<DependencyDeclaration>,
    /// Published artifacts, in declaration order
    pub artifacts: Vec<PublishArtifact>,
    /// Whether resolution is pinned by the dependency-locking provider
    pub dependency_locking: bool,
    /// Whether other components may consume this configuration
    pub can_be_consumed: bool,
    /// Whether this configuration may be resolved
    pub can_be_resolved: bool,
    /// Conflict handling
    pub resolution_strategy: ResolutionStrategy,
}

impl Configuration {
    /// A new, empty configuration that is both consumable and resolvable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: AttributeContainer::new(),
            dependencies: Vec::new(),
            artifacts: Vec::new(),
            dependency_locking: false,
            can_be_consumed: true,
            can_be_resolved: true,
            resolution_strategy: ResolutionStrategy::default(),
        }
    }
}

/// Exposes "all currently declared configurations" in declaration order.
pub trait ConfigurationsProvider: Send + Sync {
    /// Snapshot of the configurations.
    fn all(&self) -> Vec<Configuration>;
}

/// The project's configuration registry.
///
/// Interior mutability lets the container be shared (`Arc`) between the code that
/// declares configurations and the builders that read them.
#[derive(Default)]
pub struct ConfigurationContainer {
    configurations: RwLock<Vec<Configuration>>,
    validators: RwLock<Vec<Arc<dyn MutationValidator>>>,
}

impl ConfigurationContainer {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validator notified before each mutation.
    pub fn add_validator(&self, validator: Arc<dyn MutationValidator>) {
        self.validators.write().unwrap_or_else(PoisonError::into_inner).push(validator);
    }

    /// Declare a new configuration.
    ///
    /// A new configuration contributes its dependencies to the root component, so this
    /// is announced as a [`MutationType::Dependencies`] change.
    pub fn create(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(CmetaError::DuplicateConfiguration {
                name: name.to_string(),
            }
            .into());
        }
        self.notify(MutationType::Dependencies);
        self.configurations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Configuration::new(name));
        Ok(())
    }

    /// Add a dependency declaration.
    pub fn add_dependency(&self, configuration: &str, dependency: DependencyDeclaration) -> Result<()> {
        self.mutate(configuration, MutationType::Dependencies, |c| c.dependencies.push(dependency))
    }

    /// Add a published artifact.
    pub fn add_artifact(&self, configuration: &str, artifact: PublishArtifact) -> Result<()> {
        self.mutate(configuration, MutationType::Artifacts, |c| c.artifacts.push(artifact))
    }

    /// Set a resolution attribute of the configuration.
    pub fn set_attribute(&self, configuration: &str, key: &str, value: &str) -> Result<()> {
        self.mutate(configuration, MutationType::DependencyAttributes, |c| {
            c.attributes.insert(key, value);
        })
    }

    /// Set an attribute on every dependency declared with `notation`.
    pub fn set_dependency_attribute(
        &self,
        configuration: &str,
        notation: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.mutate(configuration, MutationType::DependencyAttributes, |c| {
            for dependency in c.dependencies.iter_mut().filter(|d| d.notation() == notation) {
                dependency.attributes.insert(key, value);
            }
        })
    }

    /// Enable or disable dependency locking.
    ///
    /// Locked versions become part of the root metadata, so this counts as a
    /// dependency change.
    pub fn set_dependency_locking(&self, configuration: &str, enabled: bool) -> Result<()> {
        self.mutate(configuration, MutationType::Dependencies, |c| c.dependency_locking = enabled)
    }

    /// Replace the resolution strategy.
    pub fn set_resolution_strategy(
        &self,
        configuration: &str,
        strategy: ResolutionStrategy,
    ) -> Result<()> {
        self.mutate(configuration, MutationType::Strategy, |c| c.resolution_strategy = strategy)
    }

    /// Change whether the configuration is consumable and resolvable.
    pub fn set_roles(&self, configuration: &str, consumable: bool, resolvable: bool) -> Result<()> {
        self.mutate(configuration, MutationType::Role, |c| {
            c.can_be_consumed = consumable;
            c.can_be_resolved = resolvable;
        })
    }

    /// Snapshot of the configuration named `name`.
    pub fn get(&self, name: &str) -> Option<Configuration> {
        self.read().iter().find(|c| c.name == name).cloned()
    }

    /// Whether a configuration named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.read().iter().any(|c| c.name == name)
    }

    /// Configuration names in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.read().iter().map(|c| c.name.clone()).collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Configuration>> {
        self.configurations.read().unwrap_or_else(PoisonError::into_inner)
    }

    // Validators run with no container lock held: they may read the container.
    fn notify(&self, kind: MutationType) {
        let validators = self.validators.read().unwrap_or_else(PoisonError::into_inner).clone();
        tracing::trace!("Notifying {} validator(s) of {} mutation", validators.len(), kind);
        for validator in validators {
            validator.validate_mutation(kind);
        }
    }

    fn mutate(
        &self,
        configuration: &str,
        kind: MutationType,
        apply: impl FnOnce(&mut Configuration),
    ) -> Result<()> {
        if !self.contains(configuration) {
            return Err(CmetaError::ConfigurationNotFound {
                name: configuration.to_string(),
            }
            .into());
        }
        self.notify(kind);

        let mut configurations = self.configurations.write().unwrap_or_else(PoisonError::into_inner);
        let target = configurations.iter_mut().find(|c| c.name == configuration).ok_or_else(|| {
            CmetaError::ConfigurationNotFound {
                name: configuration.to_string(),
            }
        })?;
        apply(target);
        Ok(())
    }
}

impl ConfigurationsProvider for ConfigurationContainer {
    fn all(&self) -> Vec<Configuration> {
        self.read().clone()
    }
}

/// Exposes only the named configurations of another provider, in the source's order.
///
/// Used with [`RootComponentMetadataBuilder::with_configurations_provider`] when only a
/// subset of configurations should form the root component.
///
/// [`RootComponentMetadataBuilder::with_configurations_provider`]: crate::root::RootComponentMetadataBuilder::with_configurations_provider
pub struct NamedConfigurationsProvider {
    source: Arc<dyn ConfigurationsProvider>,
    names: Vec<String>,
}

impl NamedConfigurationsProvider {
    /// Restrict `source` to `names`.
    pub fn new(source: Arc<dyn ConfigurationsProvider>, names: Vec<String>) -> Self {
        Self {
            source,
            names,
        }
    }
}

impl ConfigurationsProvider for NamedConfigurationsProvider {
    fn all(&self) -> Vec<Configuration> {
        self.source.all().into_iter().filter(|c| self.names.contains(&c.name)).collect()
    }
}
