//! Common helpers for cmeta integration tests
//!
//! Builds the project-side collaborators most tests need and wraps the `cmeta` binary.

// Not every helper is used by every test module
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::Path;
use std::sync::Arc;

use cmeta_cli::identity::Module;
use cmeta_cli::project::{
    AttributesSchema, ConfigurationContainer, InMemoryLockingProvider, ProjectIdentity,
    ProjectRegistry, ProjectState,
};
use cmeta_cli::root::RootComponentMetadataBuilder;

/// A project `:app` with one `runtime` configuration, wired for invalidation.
pub struct RootFixture {
    pub identity: Arc<ProjectIdentity>,
    pub configurations: Arc<ConfigurationContainer>,
    pub builder: RootComponentMetadataBuilder,
}

impl RootFixture {
    pub fn new() -> Self {
        let identity = Arc::new(ProjectIdentity::new(
            Module::new("org.example", "app", "1.0").with_project_path(":app"),
        ));

        let mut locking = InMemoryLockingProvider::new();
        locking.lock("runtime", vec!["org.example:lib:2.0".parse().unwrap()]);
        let mut registry = ProjectRegistry::new();
        registry.register(
            ProjectState::new(":app")
                .with_schema(AttributesSchema::new().with_attribute("usage"))
                .with_locking(Arc::new(locking)),
        );

        let configurations = Arc::new(ConfigurationContainer::new());
        let builder =
            RootComponentMetadataBuilder::new(identity.clone(), Arc::new(registry), configurations.clone());
        configurations.add_validator(builder.validator());
        configurations.create("runtime").unwrap();

        Self {
            identity,
            configurations,
            builder,
        }
    }
}

/// The `cmeta` binary running in `dir` with colors off.
pub fn cmeta(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cmeta").unwrap();
    cmd.current_dir(dir).arg("--no-color").env_remove("RUST_LOG");
    cmd
}
