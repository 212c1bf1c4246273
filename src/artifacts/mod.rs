//! Resolved artifacts and lazy, filtered views over them.
//!
//! A [`ResolutionResult`] holds the components a configuration resolved to, in
//! declaration order, each with the artifacts it natively provides. Nothing is built
//! when the result is created: native artifacts of local projects are produced on first
//! access through their [`ArtifactProducer`], and transformed forms are produced by the
//! [`TransformPipeline`] only when an [`ArtifactView`] that needs them is iterated.
//!
//! # Example
//!
//! ```rust
//! use cmeta_cli::artifacts::{NoTransforms, ResolutionResult, ResolvableArtifact, ResolvedComponent, ViewConfiguration};
//! use cmeta_cli::core::AttributeContainer;
//! use cmeta_cli::identity::{ComponentArtifactIdentifier, ComponentIdentifier};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let lib = ComponentIdentifier::opaque("lib.jar");
//! let result = ResolutionResult::new(
//!     "runtime",
//!     AttributeContainer::new(),
//!     vec![ResolvedComponent::new(
//!         lib.clone(),
//!         vec![ResolvableArtifact::file(
//!             ComponentArtifactIdentifier::new(lib, "lib.jar"),
//!             AttributeContainer::new(),
//!             "libs/lib.jar",
//!         )],
//!     )],
//!     Arc::new(NoTransforms),
//! );
//!
//! let files = result.view(ViewConfiguration::new()).files().collect::<anyhow::Result<Vec<_>>>()?;
//! assert_eq!(files.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod transform;
pub mod view;

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::core::{AttributeContainer, CmetaError};
use crate::identity::{ComponentArtifactIdentifier, ComponentIdentifier};

pub use transform::{NoTransforms, TransformCache, TransformPipeline};
pub use view::{ArtifactView, Artifacts, ComponentFilter, ViewConfiguration};

/// Builds the native file of an artifact on demand (a project's jar task, say).
pub trait ArtifactProducer: Send + Sync {
    /// Build `artifact` and return where its file was written.
    fn produce(&self, artifact: &ComponentArtifactIdentifier) -> Result<PathBuf>;
}

enum ArtifactSource {
    File(PathBuf),
    Produced(Arc<dyn ArtifactProducer>),
}

/// An artifact whose file may not exist until it is asked for.
pub struct ResolvableArtifact {
    id: ComponentArtifactIdentifier,
    attributes: AttributeContainer,
    source: ArtifactSource,
    built: OnceLock<Result<PathBuf, String>>,
}

impl ResolvableArtifact {
    /// An artifact backed by an existing file.
    pub fn file(
        id: ComponentArtifactIdentifier,
        attributes: AttributeContainer,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::with_source(id, attributes, ArtifactSource::File(path.into()))
    }

    /// An artifact that `producer` builds the first time its file is needed.
    pub fn produced(
        id: ComponentArtifactIdentifier,
        attributes: AttributeContainer,
        producer: Arc<dyn ArtifactProducer>,
    ) -> Self {
        Self::with_source(id, attributes, ArtifactSource::Produced(producer))
    }

    fn with_source(
        id: ComponentArtifactIdentifier,
        attributes: AttributeContainer,
        source: ArtifactSource,
    ) -> Self {
        Self {
            id,
            attributes,
            source,
            built: OnceLock::new(),
        }
    }

    /// Artifact identifier.
    pub fn id(&self) -> &ComponentArtifactIdentifier {
        &self.id
    }

    /// Attributes of the native artifact.
    pub fn attributes(&self) -> &AttributeContainer {
        &self.attributes
    }

    /// The native file, building it first if needed. Builds run at most once.
    pub fn file_path(&self) -> Result<PathBuf> {
        match &self.source {
            ArtifactSource::File(path) => Ok(path.clone()),
            ArtifactSource::Produced(producer) => self
                .built
                .get_or_init(|| producer.produce(&self.id).map_err(|e| format!("{e:#}")))
                .clone()
                .map_err(|reason| {
                    CmetaError::ArtifactBuildFailed {
                        artifact: self.id.to_string(),
                        reason,
                    }
                    .into()
                }),
        }
    }

    /// Whether the native file has been built (always true for plain files).
    pub fn is_available(&self) -> bool {
        match self.source {
            ArtifactSource::File(_) => true,
            ArtifactSource::Produced(_) => self.built.get().is_some(),
        }
    }
}

impl fmt::Debug for ResolvableArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvableArtifact")
            .field("id", &self.id)
            .field("attributes", &self.attributes)
            .field("available", &self.is_available())
            .finish()
    }
}

/// A component of the resolved graph with its native artifacts.
#[derive(Debug)]
pub struct ResolvedComponent {
    /// Component identity; file dependencies carry an opaque identifier
    pub id: ComponentIdentifier,
    /// Native artifacts, in publication order
    pub artifacts: Vec<ResolvableArtifact>,
}

impl ResolvedComponent {
    /// Create a resolved component.
    pub fn new(id: ComponentIdentifier, artifacts: Vec<ResolvableArtifact>) -> Self {
        Self {
            id,
            artifacts,
        }
    }
}

/// One artifact file yielded by a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArtifactResult {
    /// Artifact identifier; for transformed artifacts, named after the produced file
    pub id: ComponentArtifactIdentifier,
    /// The file
    pub file: PathBuf,
    /// Attributes of this form of the artifact
    pub attributes: AttributeContainer,
}

/// The artifacts a configuration resolved to.
pub struct ResolutionResult {
    configuration: String,
    attributes: AttributeContainer,
    components: Vec<ResolvedComponent>,
    pipeline: Arc<dyn TransformPipeline>,
    transforms: TransformCache,
}

impl ResolutionResult {
    /// A result for `configuration`, whose resolution attributes are `attributes`.
    pub fn new(
        configuration: impl Into<String>,
        attributes: AttributeContainer,
        components: Vec<ResolvedComponent>,
        pipeline: Arc<dyn TransformPipeline>,
    ) -> Self {
        Self {
            configuration: configuration.into(),
            attributes,
            components,
            pipeline,
            transforms: TransformCache::new(),
        }
    }

    /// Name of the resolved configuration.
    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    /// The configuration's own resolution attributes.
    pub fn attributes(&self) -> &AttributeContainer {
        &self.attributes
    }

    /// Resolved components, in declaration order.
    pub fn components(&self) -> &[ResolvedComponent] {
        &self.components
    }

    /// Transforms run so far during this resolution.
    pub fn transform_cache(&self) -> &TransformCache {
        &self.transforms
    }

    /// A lazy view over this result. Creating it does no work.
    pub fn view(&self, configuration: ViewConfiguration) -> ArtifactView<'_> {
        ArtifactView::new(self, configuration)
    }

    pub(crate) fn pipeline(&self) -> &dyn TransformPipeline {
        self.pipeline.as_ref()
    }
}

impl fmt::Debug for ResolutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionResult")
            .field("configuration", &self.configuration)
            .field("attributes", &self.attributes)
            .field("components", &self.components)
            .finish_non_exhaustive()
    }
}
