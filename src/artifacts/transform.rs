//! Artifact transforms and their per-resolution memoisation.

use anyhow::Result;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use crate::core::{AttributeContainer, CmetaError};
use crate::identity::ComponentArtifactIdentifier;

/// Converts artifacts from one attribute form to another.
pub trait TransformPipeline: Send + Sync {
    /// Whether an artifact carrying `from` can be turned into one satisfying `to`.
    fn can_transform(&self, from: &AttributeContainer, to: &AttributeContainer) -> bool;

    /// Transform `file`, the native file of `artifact`, and return the produced files.
    fn transform(
        &self,
        artifact: &ComponentArtifactIdentifier,
        file: &Path,
        from: &AttributeContainer,
        to: &AttributeContainer,
    ) -> Result<Vec<PathBuf>>;
}

/// A pipeline that transforms nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransforms;

impl TransformPipeline for NoTransforms {
    fn can_transform(&self, _from: &AttributeContainer, _to: &AttributeContainer) -> bool {
        false
    }

    fn transform(
        &self,
        artifact: &ComponentArtifactIdentifier,
        _file: &Path,
        _from: &AttributeContainer,
        to: &AttributeContainer,
    ) -> Result<Vec<PathBuf>> {
        Err(CmetaError::TransformFailed {
            artifact: artifact.to_string(),
            requested: to.clone(),
            reason: "no transforms are registered".to_string(),
        }
        .into())
    }
}

type TransformKey = (ComponentArtifactIdentifier, AttributeContainer);
type TransformCell = Arc<OnceLock<Result<Vec<PathBuf>, String>>>;

/// Results of transforms run during one resolution, keyed by artifact and target.
///
/// Each (artifact, target attributes) pair is transformed at most once; later requests,
/// from the same view or another one, get the stored outcome. Failures are stored too.
#[derive(Debug, Default)]
pub struct TransformCache {
    results: DashMap<TransformKey, TransformCell>,
}

impl TransformCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The transformed files of `artifact`, running `pipeline` on first request.
    pub fn get_or_transform(
        &self,
        pipeline: &dyn TransformPipeline,
        artifact: &ComponentArtifactIdentifier,
        file: &Path,
        from: &AttributeContainer,
        to: &AttributeContainer,
    ) -> Result<Vec<PathBuf>> {
        // Clone the cell out so no shard lock is held while the transform runs.
        let cell = self
            .results
            .entry((artifact.clone(), to.clone()))
            .or_default()
            .clone();

        let mut ran = false;
        let outcome = cell.get_or_init(|| {
            ran = true;
            info!("Transforming {} to {}", artifact, to);
            pipeline.transform(artifact, file, from, to).map_err(|e| format!("{e:#}"))
        });
        if !ran {
            debug!("Reusing transform of {} to {}", artifact, to);
        }

        outcome.clone().map_err(|reason| {
            CmetaError::TransformFailed {
                artifact: artifact.to_string(),
                requested: to.clone(),
                reason,
            }
            .into()
        })
    }

    /// Number of distinct (artifact, target) pairs requested so far.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether nothing has been transformed.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
