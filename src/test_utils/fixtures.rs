//! Fixtures: resolution results and descriptor files.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::artifacts::{ArtifactProducer, ResolutionResult, ResolvableArtifact, ResolvedComponent, TransformPipeline};
use crate::config::workspace::file_attributes;
use crate::config::{ARTIFACT_TYPE, DESCRIPTOR_FILE};
use crate::core::AttributeContainer;
use crate::identity::{ComponentArtifactIdentifier, ComponentIdentifier};

/// A `runtime` resolution of one project per entry of `paths`.
///
/// Project `:a` contributes `a.jar` (`type=jar`), built by `producer` on demand.
pub fn project_result(
    paths: &[&str],
    producer: Arc<dyn ArtifactProducer>,
    pipeline: Arc<dyn TransformPipeline>,
) -> ResolutionResult {
    let components = paths
        .iter()
        .map(|path| {
            let id = ComponentIdentifier::project(*path);
            let name = format!("{}.jar", path.rsplit(':').next().unwrap_or(*path));
            ResolvedComponent::new(
                id.clone(),
                vec![ResolvableArtifact::produced(
                    ComponentArtifactIdentifier::new(id, name),
                    AttributeContainer::new().with(ARTIFACT_TYPE, "jar"),
                    producer.clone(),
                )],
            )
        })
        .collect();
    ResolutionResult::new("runtime", AttributeContainer::new(), components, pipeline)
}

/// A file dependency component for `file`, identified by its path and typed by its
/// extension.
pub fn file_component(file: &str) -> ResolvedComponent {
    let path = Path::new(file);
    let name = path.file_name().map_or_else(|| file.to_string(), |n| n.to_string_lossy().into_owned());
    let id = ComponentIdentifier::opaque(file);
    ResolvedComponent::new(
        id.clone(),
        vec![ResolvableArtifact::file(ComponentArtifactIdentifier::new(id, name), file_attributes(path), file)],
    )
}

/// A `cmeta.toml` written into a temporary directory.
pub struct DescriptorFixture {
    dir: TempDir,
}

impl DescriptorFixture {
    /// Write `content` as `cmeta.toml` in a fresh temporary directory.
    pub fn new(content: &str) -> Result<Self> {
        let dir = TempDir::new().context("Failed to create temp dir")?;
        std::fs::write(dir.path().join(DESCRIPTOR_FILE), content)
            .context("Failed to write cmeta.toml")?;
        Ok(Self {
            dir,
        })
    }

    /// A two-project build with rules, replacements and a transform.
    pub fn sample() -> Result<Self> {
        Self::new(SAMPLE_DESCRIPTOR)
    }

    /// The temporary project directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the descriptor.
    pub fn descriptor_path(&self) -> PathBuf {
        self.dir.path().join(DESCRIPTOR_FILE)
    }
}

/// Descriptor behind [`DescriptorFixture::sample`].
pub const SAMPLE_DESCRIPTOR: &str = r#"
[project]
group = "org.example"
name = "app"
version = "1.0"
path = ":app"

[schema]
attributes = ["usage", "type"]

[[configurations]]
name = "runtime"
attributes = { usage = "runtime" }
dependency-locking = true
dependencies = ["org.example:lib:2.0", ":a", ":b"]
files = ["libs/local.jar"]
artifacts = [{ name = "app.jar", attributes = { type = "jar" } }]

[[configurations]]
name = "compile"
attributes = { usage = "api" }
dependencies = ["org.example:api:1.0"]

[locks]
runtime = ["org.example:lib:2.0"]

[[components]]
id = "org.ivy:mod:1.0"
format = "ivy"
branch = "release"

[[components]]
id = "org.maven:lib:3.1"
format = "maven"
status = "milestone"

[[rules]]
module = "org.ivy:*"
requires = ["ivy-descriptor"]
status-from-branch = true

[[rules]]
changing = false
attributes = { "component.normalised" = "true" }

[[replacements]]
module = "org.old:lib"
replaced-by = "org.maven:lib"
reason = "renamed"

[[projects]]
path = ":a"
artifacts = [{ name = "a.jar", attributes = { type = "jar" } }]

[[projects]]
path = ":b"
artifacts = [{ name = "b.jar", attributes = { type = "jar" } }]

[[transforms]]
from = { type = "jar" }
to = { type = "classes" }
suffix = "-classes"
"#;
