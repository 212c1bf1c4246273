//! The root component metadata snapshot and the builder that attaches configurations.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;

use crate::core::AttributeContainer;
use crate::identity::{ComponentIdentifier, ModuleVersionIdentifier};
use crate::project::locking::DependencyLockingProvider;
use crate::project::{AttributesSchema, Configuration, DependencyDeclaration, PublishArtifact};

/// Metadata of one configuration of the root component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfigurationMetadata {
    /// Configuration name
    pub name: String,
    /// Resolution attributes
    pub attributes: AttributeContainer,
    /// Declared dependencies, in declaration order
    pub dependencies: Vec<DependencyDeclaration>,
    /// Published artifacts, in declaration order
    pub artifacts: Vec<PublishArtifact>,
    /// Versions pinned by dependency locking (empty when locking is off)
    pub locked_versions: Vec<ModuleVersionIdentifier>,
}

/// What the resolving project looks like as a dependency: the root of the graph.
///
/// Built once per cache miss and shared behind an [`Arc`]; it is never modified after
/// the builder hands it out.
pub struct RootLocalComponentMetadata {
    id: ModuleVersionIdentifier,
    component_id: ComponentIdentifier,
    status: String,
    attributes_schema: Option<Arc<AttributesSchema>>,
    dependency_locking: Arc<dyn DependencyLockingProvider>,
    configurations: Vec<LocalConfigurationMetadata>,
}

impl RootLocalComponentMetadata {
    /// Create metadata with no configurations attached yet.
    pub fn new(
        id: ModuleVersionIdentifier,
        component_id: ComponentIdentifier,
        status: impl Into<String>,
        attributes_schema: Option<Arc<AttributesSchema>>,
        dependency_locking: Arc<dyn DependencyLockingProvider>,
    ) -> Self {
        Self {
            id,
            component_id,
            status: status.into(),
            attributes_schema,
            dependency_locking,
            configurations: Vec::new(),
        }
    }

    /// `group:name:version` of the root module.
    pub fn id(&self) -> &ModuleVersionIdentifier {
        &self.id
    }

    /// The component identifier this snapshot was built for.
    pub fn component_id(&self) -> &ComponentIdentifier {
        &self.component_id
    }

    /// Status label.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Attribute schema, absent when the component is external to the build.
    pub fn attributes_schema(&self) -> Option<&Arc<AttributesSchema>> {
        self.attributes_schema.as_ref()
    }

    /// The dependency-locking provider the snapshot was built with.
    pub fn dependency_locking(&self) -> &Arc<dyn DependencyLockingProvider> {
        &self.dependency_locking
    }

    /// Attached configurations, in registry order.
    pub fn configurations(&self) -> &[LocalConfigurationMetadata] {
        &self.configurations
    }

    /// The configuration named `name`.
    pub fn configuration(&self, name: &str) -> Option<&LocalConfigurationMetadata> {
        self.configurations.iter().find(|c| c.name == name)
    }

    /// Attach a configuration. Only builders call this, before sharing the snapshot.
    pub fn add_configuration(&mut self, configuration: LocalConfigurationMetadata) {
        self.configurations.push(configuration);
    }
}

impl fmt::Debug for RootLocalComponentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootLocalComponentMetadata")
            .field("id", &self.id)
            .field("component_id", &self.component_id)
            .field("status", &self.status)
            .field("has_schema", &self.attributes_schema.is_some())
            .field("configurations", &self.configurations.len())
            .finish()
    }
}

/// Converts configurations into root configuration metadata.
pub trait LocalComponentMetadataBuilder: Send + Sync {
    /// Attach every configuration in `configurations` to `metadata`.
    fn add_configurations(
        &self,
        metadata: &mut RootLocalComponentMetadata,
        configurations: &[Configuration],
    ) -> Result<()>;
}

/// Copies each configuration and loads lock state for those with locking enabled.
#[derive(Debug, Default)]
pub struct DefaultLocalComponentMetadataBuilder;

impl LocalComponentMetadataBuilder for DefaultLocalComponentMetadataBuilder {
    fn add_configurations(
        &self,
        metadata: &mut RootLocalComponentMetadata,
        configurations: &[Configuration],
    ) -> Result<()> {
        for configuration in configurations {
            let locked_versions = if configuration.dependency_locking {
                metadata.dependency_locking().load_lock_state(&configuration.name).locked
            } else {
                Vec::new()
            };

            metadata.add_configuration(LocalConfigurationMetadata {
                name: configuration.name.clone(),
                attributes: configuration.attributes.clone(),
                dependencies: configuration.dependencies.clone(),
                artifacts: configuration.artifacts.clone(),
                locked_versions,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{InMemoryLockingProvider, NoOpDependencyLockingProvider};

    #[test]
    fn test_locked_versions_only_for_locking_configurations() {
        let mut provider = InMemoryLockingProvider::new();
        provider.lock("runtime", vec![ModuleVersionIdentifier::new("g", "n", "1")]);
        provider.lock("compile", vec![ModuleVersionIdentifier::new("g", "n", "2")]);

        let mut metadata = RootLocalComponentMetadata::new(
            ModuleVersionIdentifier::new("org", "app", "1"),
            ComponentIdentifier::project(":app"),
            "integration",
            None,
            Arc::new(provider),
        );

        let mut runtime = Configuration::new("runtime");
        runtime.dependency_locking = true;
        let compile = Configuration::new("compile");

        DefaultLocalComponentMetadataBuilder
            .add_configurations(&mut metadata, &[runtime, compile])
            .unwrap();

        assert_eq!(metadata.configurations().len(), 2);
        assert_eq!(metadata.configuration("runtime").unwrap().locked_versions.len(), 1);
        assert!(metadata.configuration("compile").unwrap().locked_versions.is_empty());
    }

    #[test]
    fn test_debug_omits_provider() {
        let metadata = RootLocalComponentMetadata::new(
            ModuleVersionIdentifier::new("org", "app", "1"),
            ComponentIdentifier::project(":app"),
            "integration",
            None,
            NoOpDependencyLockingProvider::instance(),
        );
        assert!(format!("{metadata:?}").contains("has_schema: false"));
    }
}
