//! Project descriptor loading.
//!
//! A build is described by a `cmeta.toml` file next to the project. The descriptor
//! declares the project's coordinates, its configurations, external component metadata,
//! metadata rules, module replacements, sibling projects and artifact transforms.
//!
//! # Modules
//!
//! - [`descriptor`] - the serde model of `cmeta.toml` and its async loader
//! - [`rules`] - `[[rules]]` tables as component metadata rules
//! - [`workspace`] - wiring the descriptor into live collaborators
//!
//! # Example descriptor
//!
//! ```toml
//! [project]
//! group = "org.example"
//! name = "app"
//! version = "1.0"
//! path = ":app"
//!
//! [[configurations]]
//! name = "runtime"
//! attributes = { usage = "runtime" }
//! dependencies = ["org.example:lib:2.0", ":core"]
//!
//! [[projects]]
//! path = ":core"
//! artifacts = [{ name = "core.jar", attributes = { type = "jar" } }]
//!
//! [[rules]]
//! module = "org.example:*"
//! set-status = "release"
//! ```
//!
//! # Loading
//!
//! ```rust,no_run
//! use cmeta_cli::config::ProjectWorkspace;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let workspace = ProjectWorkspace::load(Path::new("cmeta.toml")).await?;
//! let root = workspace.root_builder().to_root_metadata()?;
//! println!("{}", root.id());
//! # Ok(())
//! # }
//! ```

pub mod descriptor;
pub mod rules;
pub mod workspace;

/// Default descriptor file name.
pub const DESCRIPTOR_FILE: &str = "cmeta.toml";

pub use descriptor::{
    ArtifactSection, ComponentFormat, ComponentSection, ConfigurationSection, ProjectDescriptor,
    ProjectSection, RepositorySection, ReplacementSection, RequiredInput, RuleSection,
    SchemaSection, SiblingProjectSection, TransformSection,
};
pub use rules::DeclarativeRule;
pub use workspace::{ARTIFACT_TYPE, DeclaredTransforms, ProjectArtifactProducer, ProjectWorkspace};
