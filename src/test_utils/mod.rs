//! Test utilities for cmeta
//!
//! Helpers for unit and integration tests:
//! - [`init_test_logging`] installs a test-friendly tracing subscriber once
//! - [`RecordingProducer`] and [`RecordingTransform`] record which artifacts were built
//!   or transformed, so tests can assert that filtered-out work never ran
//! - [`fixtures`] builds resolution results and descriptor files
//!
//! # Example
//!
//! ```rust,no_run
//! use cmeta_cli::artifacts::ViewConfiguration;
//! use cmeta_cli::test_utils::{RecordingProducer, RecordingTransform, fixtures};
//! use std::sync::Arc;
//!
//! let producer = Arc::new(RecordingProducer::new());
//! let transform = Arc::new(RecordingTransform::jar_to("classes"));
//! let result = fixtures::project_result(&[":a", ":b"], producer.clone(), transform.clone());
//!
//! let view = result.view(ViewConfiguration::new().component_filter(|id| id.to_string().ends_with(":a")));
//! let _ = view.files().count();
//! assert_eq!(producer.produced(), vec!["a.jar"]);
//! ```

pub mod fixtures;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once, PoisonError};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::artifacts::{ArtifactProducer, TransformPipeline};
use crate::config::{ARTIFACT_TYPE, DeclaredTransforms, TransformSection};
use crate::core::AttributeContainer;
use crate::identity::ComponentArtifactIdentifier;

pub use fixtures::DescriptorFixture;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG` if set; without either, tests run
/// without a subscriber.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Artifact producer that records every build.
///
/// Files are reported under `build/` and never written.
#[derive(Debug, Default)]
pub struct RecordingProducer {
    produced: Mutex<Vec<String>>,
}

impl RecordingProducer {
    /// A producer that has built nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the artifacts built so far, in build order.
    pub fn produced(&self) -> Vec<String> {
        self.produced.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// How many times `name` was built.
    pub fn count(&self, name: &str) -> usize {
        self.produced().iter().filter(|n| *n == name).count()
    }
}

impl ArtifactProducer for RecordingProducer {
    fn produce(&self, artifact: &ComponentArtifactIdentifier) -> Result<PathBuf> {
        self.produced.lock().unwrap_or_else(PoisonError::into_inner).push(artifact.name.clone());
        Ok(Path::new("build").join(&artifact.name))
    }
}

/// Transform pipeline that records every transform it runs.
#[derive(Debug)]
pub struct RecordingTransform {
    inner: DeclaredTransforms,
    transformed: Mutex<Vec<String>>,
}

impl RecordingTransform {
    /// Transforms `type=jar` artifacts into `type=<target>` with a `-<target>` suffix.
    pub fn jar_to(target: &str) -> Self {
        Self {
            inner: DeclaredTransforms::new(vec![TransformSection {
                from: AttributeContainer::new().with(ARTIFACT_TYPE, "jar"),
                to: AttributeContainer::new().with(ARTIFACT_TYPE, target),
                suffix: format!("-{target}"),
            }]),
            transformed: Mutex::new(Vec::new()),
        }
    }

    /// Names of the artifacts transformed so far, in order.
    pub fn transformed(&self) -> Vec<String> {
        self.transformed.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of transforms run.
    pub fn calls(&self) -> usize {
        self.transformed.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl TransformPipeline for RecordingTransform {
    fn can_transform(&self, from: &AttributeContainer, to: &AttributeContainer) -> bool {
        self.inner.can_transform(from, to)
    }

    fn transform(
        &self,
        artifact: &ComponentArtifactIdentifier,
        file: &Path,
        from: &AttributeContainer,
        to: &AttributeContainer,
    ) -> Result<Vec<PathBuf>> {
        self.transformed.lock().unwrap_or_else(PoisonError::into_inner).push(artifact.name.clone());
        self.inner.transform(artifact, file, from, to)
    }
}
