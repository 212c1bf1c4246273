//! Root component metadata caching.
//!
//! [`RootComponentMetadataBuilder`] produces the immutable snapshot describing the
//! resolving project as a dependency (the root of the graph) and caches it.
//!
//! # Cache State Machine
//!
//! The cache slot has two states:
//!
//! ```text
//!            build on miss
//! Invalid ─────────────────▶ Valid(snapshot)
//!    ▲                            │
//!    └────────────────────────────┘
//!  dependencies / artifacts / dependency-attributes mutation,
//!  or the project's component identifier changed
//! ```
//!
//! A read in `Valid` returns the cached [`Arc`] when the snapshot was built for the
//! component identifier derived from the current module; otherwise the snapshot is
//! discarded and rebuilt. Mutation notifications arrive through the
//! [`MutationValidator`] returned by [`RootComponentMetadataBuilder::validator`]; other
//! mutation kinds leave the slot untouched.
//!
//! Builds run without the slot locked, so a configurations provider or local builder
//! that mutates configurations while a snapshot is built does not block. A snapshot
//! whose build overlapped an invalidation is returned but not cached.
//!
//! Builders derived with [`RootComponentMetadataBuilder::with_configurations_provider`]
//! share every collaborator except the cache slot.
//!
//! # Example
//!
//! ```rust
//! use cmeta_cli::identity::Module;
//! use cmeta_cli::mutation::MutationType;
//! use cmeta_cli::project::{ConfigurationContainer, ProjectIdentity, ProjectRegistry};
//! use cmeta_cli::root::RootComponentMetadataBuilder;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let configurations = Arc::new(ConfigurationContainer::new());
//! let builder = RootComponentMetadataBuilder::new(
//!     Arc::new(ProjectIdentity::new(Module::new("org.example", "app", "1.0"))),
//!     Arc::new(ProjectRegistry::new()),
//!     configurations.clone(),
//! );
//! configurations.add_validator(builder.validator());
//!
//! let first = builder.to_root_metadata()?;
//! assert!(Arc::ptr_eq(&first, &builder.to_root_metadata()?));
//!
//! configurations.create("runtime")?;
//! assert!(!Arc::ptr_eq(&first, &builder.to_root_metadata()?));
//! # Ok(())
//! # }
//! ```

pub mod metadata;

use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::identity::{ComponentIdentifier, Module};
use crate::mutation::{MutationType, MutationValidator};
use crate::project::locking::NoOpDependencyLockingProvider;
use crate::project::{ConfigurationsProvider, DependencyMetaDataProvider, ProjectFinder};

pub use metadata::{
    DefaultLocalComponentMetadataBuilder, LocalComponentMetadataBuilder,
    LocalConfigurationMetadata, RootLocalComponentMetadata,
};

/// State of the cache slot.
#[derive(Debug, Default)]
enum CacheState {
    /// No usable snapshot; the next read rebuilds.
    #[default]
    Invalid,
    /// A snapshot built for the identifier it carries.
    Valid(Arc<RootLocalComponentMetadata>),
}

/// One cache slot, shared between a builder and the validator it hands out.
///
/// `generation` counts invalidations, so a build that raced with one is not stored.
#[derive(Debug, Default)]
struct Slot {
    state: CacheState,
    generation: u64,
}

#[derive(Debug, Default)]
struct MetadataHolder {
    slot: Mutex<Slot>,
}

impl MetadataHolder {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn invalidate(&self) {
        let mut slot = self.lock();
        slot.state = CacheState::Invalid;
        slot.generation += 1;
    }

    fn is_valid(&self) -> bool {
        matches!(self.lock().state, CacheState::Valid(_))
    }
}

impl MutationValidator for MetadataHolder {
    fn validate_mutation(&self, kind: MutationType) {
        if kind.invalidates_root_metadata() {
            debug!("Invalidating cached root metadata after {} mutation", kind);
            self.invalidate();
        }
    }
}

/// Builds and caches root component metadata.
pub struct RootComponentMetadataBuilder {
    metadata_provider: Arc<dyn DependencyMetaDataProvider>,
    project_finder: Arc<dyn ProjectFinder>,
    local_builder: Arc<dyn LocalComponentMetadataBuilder>,
    configurations: Arc<dyn ConfigurationsProvider>,
    holder: Arc<MetadataHolder>,
}

impl RootComponentMetadataBuilder {
    /// Create a builder using [`DefaultLocalComponentMetadataBuilder`].
    pub fn new(
        metadata_provider: Arc<dyn DependencyMetaDataProvider>,
        project_finder: Arc<dyn ProjectFinder>,
        configurations: Arc<dyn ConfigurationsProvider>,
    ) -> Self {
        Self::with_local_builder(
            metadata_provider,
            project_finder,
            Arc::new(DefaultLocalComponentMetadataBuilder),
            configurations,
        )
    }

    /// Create a builder with a custom configuration-to-metadata conversion.
    pub fn with_local_builder(
        metadata_provider: Arc<dyn DependencyMetaDataProvider>,
        project_finder: Arc<dyn ProjectFinder>,
        local_builder: Arc<dyn LocalComponentMetadataBuilder>,
        configurations: Arc<dyn ConfigurationsProvider>,
    ) -> Self {
        Self {
            metadata_provider,
            project_finder,
            local_builder,
            configurations,
            holder: Arc::new(MetadataHolder::default()),
        }
    }

    /// The project's root component metadata.
    ///
    /// Returns the cached snapshot while it is valid for the current component
    /// identifier, otherwise builds, caches and returns a new one.
    pub fn to_root_metadata(&self) -> Result<Arc<RootLocalComponentMetadata>> {
        let module = self.metadata_provider.module();
        let component_id = module.component_identifier();

        // The slot is not locked while building: the build may mutate configurations,
        // and the resulting invalidation must not block on this slot.
        let generation = {
            let mut slot = self.holder.lock();
            if let CacheState::Valid(cached) = &slot.state {
                if cached.component_id() == &component_id {
                    debug!("Reusing cached root metadata for {}", component_id);
                    return Ok(Arc::clone(cached));
                }
                debug!(
                    "Discarding root metadata for {}: project is now {}",
                    cached.component_id(),
                    component_id
                );
                slot.state = CacheState::Invalid;
            }
            slot.generation
        };

        let metadata = Arc::new(self.build(&module, component_id)?);

        let mut slot = self.holder.lock();
        if slot.generation == generation {
            slot.state = CacheState::Valid(Arc::clone(&metadata));
        } else {
            debug!("Not caching root metadata for {}: invalidated during build", metadata.component_id());
        }
        Ok(metadata)
    }

    fn build(
        &self,
        module: &Module,
        component_id: ComponentIdentifier,
    ) -> Result<RootLocalComponentMetadata> {
        let id = module.version_identifier();
        let project = module.project_path.as_deref().and_then(|path| self.project_finder.find_project(path));

        let (schema, locking) = match &project {
            Some(project) => {
                (Some(Arc::clone(&project.attributes_schema)), Arc::clone(&project.dependency_locking))
            }
            None => (None, NoOpDependencyLockingProvider::instance()),
        };

        let mut metadata =
            RootLocalComponentMetadata::new(id, component_id, module.status.clone(), schema, locking);
        let configurations = self.configurations.all();
        self.local_builder.add_configurations(&mut metadata, &configurations)?;

        debug!(
            "Built root metadata for {} with {} configuration(s)",
            metadata.component_id(),
            configurations.len()
        );
        Ok(metadata)
    }

    /// A sibling builder exposing `configurations` as the root's configurations.
    ///
    /// The sibling shares every collaborator but owns a separate cache slot, and its
    /// validator must be registered separately.
    #[must_use]
    pub fn with_configurations_provider(
        &self,
        configurations: Arc<dyn ConfigurationsProvider>,
    ) -> Self {
        Self::with_local_builder(
            Arc::clone(&self.metadata_provider),
            Arc::clone(&self.project_finder),
            Arc::clone(&self.local_builder),
            configurations,
        )
    }

    /// The mutation validator that invalidates this builder's cache slot.
    pub fn validator(&self) -> Arc<dyn MutationValidator> {
        self.holder.clone()
    }

    /// Whether a snapshot is currently cached.
    pub fn is_cached(&self) -> bool {
        self.holder.is_valid()
    }
}
