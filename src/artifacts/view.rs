//! Filtered, attribute-parameterised views over a resolution result.
//!
//! A view is a recipe, not a result: building one with [`ResolutionResult::view`] runs
//! nothing. Work happens while [`ArtifactView::artifacts`] or [`ArtifactView::files`] is
//! iterated, one component at a time, and only for components the view's filter
//! accepts. A rejected component never has its artifacts built or transformed by that
//! view. Iterating again walks the result again; native builds and transforms are
//! memoised by the result, so a second pass does not repeat them.

use anyhow::Result;
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::slice;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::artifacts::{ResolutionResult, ResolvableArtifact, ResolvedArtifactResult, ResolvedComponent};
use crate::core::{AttributeContainer, CmetaError};
use crate::identity::{ComponentArtifactIdentifier, ComponentIdentifier};

/// Predicate selecting the components a view includes.
pub type ComponentFilter = Arc<dyn Fn(&ComponentIdentifier) -> bool + Send + Sync>;

/// How to build an [`ArtifactView`].
#[derive(Clone, Default)]
pub struct ViewConfiguration {
    filter: Option<ComponentFilter>,
    attributes: AttributeContainer,
    lenient: bool,
}

impl ViewConfiguration {
    /// Every component, with the configuration's own attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only include components accepted by `filter`.
    #[must_use]
    pub fn component_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&ComponentIdentifier) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Request `key=value` on top of the configuration's attributes.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// Request every attribute of `attributes` on top of the configuration's attributes.
    #[must_use]
    pub fn attributes(mut self, attributes: &AttributeContainer) -> Self {
        self.attributes = self.attributes.merged(attributes);
        self
    }

    /// Skip artifacts that fail to build, transform or match instead of failing.
    #[must_use]
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }
}

impl fmt::Debug for ViewConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewConfiguration")
            .field("filtered", &self.filter.is_some())
            .field("attributes", &self.attributes)
            .field("lenient", &self.lenient)
            .finish()
    }
}

/// A lazy projection of a resolution result.
pub struct ArtifactView<'a> {
    result: &'a ResolutionResult,
    filter: Option<ComponentFilter>,
    requested: AttributeContainer,
    lenient: bool,
}

impl<'a> ArtifactView<'a> {
    pub(crate) fn new(result: &'a ResolutionResult, configuration: ViewConfiguration) -> Self {
        Self {
            result,
            filter: configuration.filter,
            requested: result.attributes().merged(&configuration.attributes),
            lenient: configuration.lenient,
        }
    }

    /// The attributes artifacts must satisfy.
    pub fn requested_attributes(&self) -> &AttributeContainer {
        &self.requested
    }

    /// Whether the view includes `component`.
    pub fn accepts(&self, component: &ComponentIdentifier) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(component))
    }

    /// The view's artifacts, in declaration order.
    pub fn artifacts(&self) -> Artifacts<'_> {
        Artifacts {
            view: self,
            components: self.result.components().iter(),
            current: None,
            pending: VecDeque::new(),
        }
    }

    /// The view's files, in declaration order.
    pub fn files(&self) -> impl Iterator<Item = Result<PathBuf>> + '_ {
        self.artifacts().map(|artifact| artifact.map(|a| a.file))
    }

    fn resolve(&self, artifact: &ResolvableArtifact) -> Result<Vec<ResolvedArtifactResult>> {
        let native = artifact.attributes();
        if native.is_compatible_with(&self.requested) {
            return Ok(vec![ResolvedArtifactResult {
                id: artifact.id().clone(),
                file: artifact.file_path()?,
                attributes: native.clone(),
            }]);
        }

        let pipeline = self.result.pipeline();
        if !pipeline.can_transform(native, &self.requested) {
            return Err(CmetaError::NoMatchingVariant {
                component: artifact.id().component.to_string(),
                artifact: artifact.id().name.clone(),
                requested: self.requested.clone(),
            }
            .into());
        }

        let source = artifact.file_path()?;
        let outputs = self.result.transform_cache().get_or_transform(
            pipeline,
            artifact.id(),
            &source,
            native,
            &self.requested,
        )?;
        let attributes = native.merged(&self.requested);
        Ok(outputs
            .into_iter()
            .map(|file| {
                let name = file
                    .file_name()
                    .map_or_else(|| artifact.id().name.clone(), |n| n.to_string_lossy().into_owned());
                ResolvedArtifactResult {
                    id: ComponentArtifactIdentifier::new(artifact.id().component.clone(), name),
                    file,
                    attributes: attributes.clone(),
                }
            })
            .collect())
    }
}

impl fmt::Debug for ArtifactView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactView")
            .field("configuration", &self.result.configuration())
            .field("requested", &self.requested)
            .field("filtered", &self.filter.is_some())
            .field("lenient", &self.lenient)
            .finish()
    }
}

/// Iterator over a view's artifacts. Each step does only the work its item needs.
pub struct Artifacts<'v> {
    view: &'v ArtifactView<'v>,
    components: slice::Iter<'v, ResolvedComponent>,
    current: Option<slice::Iter<'v, ResolvableArtifact>>,
    pending: VecDeque<ResolvedArtifactResult>,
}

impl Iterator for Artifacts<'_> {
    type Item = Result<ResolvedArtifactResult>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(resolved) = self.pending.pop_front() {
                return Some(Ok(resolved));
            }

            if let Some(artifact) = self.current.as_mut().and_then(Iterator::next) {
                match self.view.resolve(artifact) {
                    Ok(resolved) => self.pending.extend(resolved),
                    Err(e) if self.view.lenient => {
                        warn!("Skipping {}: {:#}", artifact.id(), e);
                    }
                    Err(e) => return Some(Err(e)),
                }
                continue;
            }

            let component = self.components.next()?;
            if self.view.accepts(&component.id) {
                self.current = Some(component.artifacts.iter());
            } else {
                debug!("Component {} excluded from view of {}", component.id, self.view.result.configuration());
                self.current = None;
            }
        }
    }
}
