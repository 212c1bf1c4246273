//! Root component metadata caching against a live configuration container.

use std::sync::Arc;

use cmeta_cli::core::AttributeContainer;
use cmeta_cli::identity::{ComponentIdentifier, Module, ModuleVersionIdentifier};
use cmeta_cli::project::{
    ConfigurationContainer, DependencyDeclaration, NamedConfigurationsProvider, ProjectIdentity,
    ProjectRegistry, PublishArtifact, ResolutionStrategy,
};
use cmeta_cli::root::RootComponentMetadataBuilder;

use crate::common::RootFixture;

#[test]
fn test_repeated_reads_share_one_snapshot() {
    let fixture = RootFixture::new();

    let first = fixture.builder.to_root_metadata().unwrap();
    let second = fixture.builder.to_root_metadata().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.component_id(), &ComponentIdentifier::project(":app"));
    assert_eq!(first.id().to_string(), "org.example:app:1.0");
}

#[test]
fn test_invalidating_mutations_rebuild() {
    let fixture = RootFixture::new();
    let configurations = &fixture.configurations;

    let before = fixture.builder.to_root_metadata().unwrap();
    configurations
        .add_dependency("runtime", DependencyDeclaration::parse("org.example:lib:2.0").unwrap())
        .unwrap();
    assert!(!fixture.builder.is_cached());
    let after_dependency = fixture.builder.to_root_metadata().unwrap();
    assert!(!Arc::ptr_eq(&before, &after_dependency));
    assert_eq!(after_dependency.configuration("runtime").unwrap().dependencies.len(), 1);

    configurations
        .add_artifact("runtime", PublishArtifact::new("app.jar", AttributeContainer::new()))
        .unwrap();
    let after_artifact = fixture.builder.to_root_metadata().unwrap();
    assert!(!Arc::ptr_eq(&after_dependency, &after_artifact));

    configurations.set_attribute("runtime", "usage", "runtime").unwrap();
    let after_attribute = fixture.builder.to_root_metadata().unwrap();
    assert!(!Arc::ptr_eq(&after_artifact, &after_attribute));

    configurations
        .set_dependency_attribute("runtime", "org.example:lib:2.0", "category", "library")
        .unwrap();
    let after_dependency_attribute = fixture.builder.to_root_metadata().unwrap();
    assert!(!Arc::ptr_eq(&after_attribute, &after_dependency_attribute));
    assert_eq!(
        after_dependency_attribute.configuration("runtime").unwrap().dependencies[0]
            .attributes
            .get("category"),
        Some("library")
    );
}

#[test]
fn test_strategy_and_role_changes_keep_snapshot() {
    let fixture = RootFixture::new();

    let before = fixture.builder.to_root_metadata().unwrap();
    fixture
        .configurations
        .set_resolution_strategy(
            "runtime",
            ResolutionStrategy {
                fail_on_version_conflict: true,
                prefer_project_modules: false,
            },
        )
        .unwrap();
    fixture.configurations.set_roles("runtime", false, true).unwrap();

    assert!(fixture.builder.is_cached());
    assert!(Arc::ptr_eq(&before, &fixture.builder.to_root_metadata().unwrap()));
}

#[test]
fn test_failed_mutation_keeps_snapshot() {
    let fixture = RootFixture::new();

    let before = fixture.builder.to_root_metadata().unwrap();
    assert!(fixture.configurations.set_attribute("missing", "usage", "api").is_err());
    assert!(Arc::ptr_eq(&before, &fixture.builder.to_root_metadata().unwrap()));
}

#[test]
fn test_changed_project_coordinates_rebuild() {
    let fixture = RootFixture::new();

    let before = fixture.builder.to_root_metadata().unwrap();
    fixture
        .identity
        .set_module(Module::new("org.example", "app", "1.0").with_project_path(":renamed"));
    let after = fixture.builder.to_root_metadata().unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.component_id(), &ComponentIdentifier::project(":renamed"));
    // ":renamed" is not a registered project
    assert!(after.attributes_schema().is_none());
}

#[test]
fn test_project_context_supplies_schema_and_locking() {
    let fixture = RootFixture::new();
    fixture.configurations.set_dependency_locking("runtime", true).unwrap();

    let metadata = fixture.builder.to_root_metadata().unwrap();

    assert!(metadata.attributes_schema().unwrap().has_attribute("usage"));
    assert_eq!(
        metadata.configuration("runtime").unwrap().locked_versions,
        vec![ModuleVersionIdentifier::new("org.example", "lib", "2.0")]
    );
}

#[test]
fn test_external_module_has_no_project_context() {
    let configurations = Arc::new(ConfigurationContainer::new());
    let builder = RootComponentMetadataBuilder::new(
        Arc::new(ProjectIdentity::new(Module::new("org.example", "tool", "3.0"))),
        Arc::new(ProjectRegistry::new()),
        configurations.clone(),
    );
    configurations.add_validator(builder.validator());
    configurations.create("runtime").unwrap();
    configurations.set_dependency_locking("runtime", true).unwrap();

    let metadata = builder.to_root_metadata().unwrap();

    assert!(metadata.attributes_schema().is_none());
    assert!(metadata.configuration("runtime").unwrap().locked_versions.is_empty());
    assert_eq!(
        metadata.component_id(),
        &ComponentIdentifier::Module(ModuleVersionIdentifier::new("org.example", "tool", "3.0"))
    );
}

#[test]
fn test_derived_builder_is_isolated() {
    let fixture = RootFixture::new();
    fixture.configurations.create("compile").unwrap();

    let derived = fixture.builder.with_configurations_provider(Arc::new(
        NamedConfigurationsProvider::new(fixture.configurations.clone(), vec!["compile".to_string()]),
    ));

    let root = fixture.builder.to_root_metadata().unwrap();
    let narrowed = derived.to_root_metadata().unwrap();
    assert!(!Arc::ptr_eq(&root, &narrowed));
    assert_eq!(root.configurations().len(), 2);
    assert_eq!(narrowed.configurations().len(), 1);
    assert_eq!(narrowed.configurations()[0].name, "compile");

    // Only the original builder's validator is registered with the container
    fixture.configurations.set_attribute("compile", "usage", "api").unwrap();
    assert!(!fixture.builder.is_cached());
    assert!(derived.is_cached());
    assert!(Arc::ptr_eq(&narrowed, &derived.to_root_metadata().unwrap()));
}
