//! Artifact views: filtering, laziness and transform memoisation.

use std::path::PathBuf;
use std::sync::Arc;

use cmeta_cli::artifacts::{NoTransforms, ResolutionResult, ResolvedComponent, ViewConfiguration};
use cmeta_cli::core::{AttributeContainer, CmetaError};
use cmeta_cli::identity::ComponentIdentifier;
use cmeta_cli::test_utils::{RecordingProducer, RecordingTransform, fixtures, init_test_logging};

fn only(path: &'static str) -> ViewConfiguration {
    let wanted = ComponentIdentifier::project(path);
    ViewConfiguration::new().component_filter(move |id| *id == wanted)
}

fn files(result: &ResolutionResult, configuration: ViewConfiguration) -> Vec<PathBuf> {
    result.view(configuration).files().collect::<anyhow::Result<Vec<_>>>().unwrap()
}

#[test]
fn test_filtered_view_builds_only_admitted_components() {
    init_test_logging(None);
    let producer = Arc::new(RecordingProducer::new());
    let result = fixtures::project_result(&[":a", ":b"], producer.clone(), Arc::new(NoTransforms));

    assert_eq!(files(&result, only(":a")), vec![PathBuf::from("build/a.jar")]);
    assert_eq!(producer.count("a.jar"), 1);
    assert_eq!(producer.count("b.jar"), 0);
}

#[test]
fn test_views_are_independent() {
    let producer = Arc::new(RecordingProducer::new());
    let result = fixtures::project_result(&[":a", ":b"], producer.clone(), Arc::new(NoTransforms));

    let filtered = files(&result, only(":b"));
    let unfiltered = files(&result, ViewConfiguration::new());

    assert_eq!(filtered, vec![PathBuf::from("build/b.jar")]);
    assert_eq!(unfiltered, vec![PathBuf::from("build/a.jar"), PathBuf::from("build/b.jar")]);
    // Native builds are shared between views of the same result
    assert_eq!(producer.produced(), vec!["b.jar", "a.jar"]);
}

#[test]
fn test_creating_a_view_does_no_work() {
    let producer = Arc::new(RecordingProducer::new());
    let transform = Arc::new(RecordingTransform::jar_to("classes"));
    let result = fixtures::project_result(&[":a", ":b"], producer.clone(), transform.clone());

    let view = result.view(ViewConfiguration::new().attribute("type", "classes"));
    let _artifacts = view.artifacts();

    assert!(producer.produced().is_empty());
    assert_eq!(transform.calls(), 0);
    assert!(result.transform_cache().is_empty());
}

#[test]
fn test_transforms_run_once_per_artifact() {
    let producer = Arc::new(RecordingProducer::new());
    let transform = Arc::new(RecordingTransform::jar_to("classes"));
    let result = fixtures::project_result(&[":a", ":b"], producer.clone(), transform.clone());

    let classes = ViewConfiguration::new().attribute("type", "classes");
    let first = files(&result, only(":a").attribute("type", "classes"));
    assert_eq!(first, vec![PathBuf::from("build/a-classes.jar")]);
    assert_eq!(transform.transformed(), vec!["a.jar"]);
    assert_eq!(producer.count("b.jar"), 0);

    let second = files(&result, classes.clone());
    let third = files(&result, classes);

    assert_eq!(second, vec![PathBuf::from("build/a-classes.jar"), PathBuf::from("build/b-classes.jar")]);
    assert_eq!(second, third);
    assert_eq!(transform.transformed(), vec!["a.jar", "b.jar"]);
    assert_eq!(producer.count("a.jar"), 1);
    assert_eq!(result.transform_cache().len(), 2);
}

#[test]
fn test_transformed_artifacts_carry_requested_attributes() {
    let producer = Arc::new(RecordingProducer::new());
    let transform = Arc::new(RecordingTransform::jar_to("classes"));
    let result = fixtures::project_result(&[":a"], producer, transform);

    let view = result.view(ViewConfiguration::new().attribute("type", "classes"));
    let artifacts = view.artifacts().collect::<anyhow::Result<Vec<_>>>().unwrap();

    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].id.name, "a-classes.jar");
    assert_eq!(artifacts[0].id.component, ComponentIdentifier::project(":a"));
    assert_eq!(artifacts[0].attributes.get("type"), Some("classes"));
}

#[test]
fn test_missing_variant_fails_unless_lenient() {
    let producer = Arc::new(RecordingProducer::new());
    let result = fixtures::project_result(&[":a", ":b"], producer, Arc::new(NoTransforms));

    let strict = result.view(ViewConfiguration::new().attribute("type", "classes"));
    let err = strict.files().next().unwrap().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CmetaError>(),
        Some(CmetaError::NoMatchingVariant { .. })
    ));

    let lenient = files(&result, ViewConfiguration::new().attribute("type", "classes").lenient(true));
    assert!(lenient.is_empty());
}

#[test]
fn test_file_dependencies_pass_filters_by_opaque_identity() {
    let producer = Arc::new(RecordingProducer::new());
    let mut components = vec![fixtures::file_component("libs/local.jar")];
    components.extend(
        fixtures::project_result(&[":a"], producer.clone(), Arc::new(NoTransforms))
            .components()
            .iter()
            .map(|c| ResolvedComponent::new(c.id.clone(), Vec::new())),
    );
    let result = ResolutionResult::new("runtime", AttributeContainer::new(), components, Arc::new(NoTransforms));

    let view = result.view(
        ViewConfiguration::new()
            .component_filter(|id| matches!(id, ComponentIdentifier::Opaque { display_name } if display_name == "libs/local.jar")),
    );
    let artifacts = view.artifacts().collect::<anyhow::Result<Vec<_>>>().unwrap();

    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].id.component, ComponentIdentifier::opaque("libs/local.jar"));
    assert_eq!(artifacts[0].id.name, "local.jar");
    assert_eq!(artifacts[0].file, PathBuf::from("libs/local.jar"));
    assert!(producer.produced().is_empty());
}

#[test]
fn test_results_follow_declaration_order() {
    let producer = Arc::new(RecordingProducer::new());
    let result = fixtures::project_result(&[":c", ":a", ":b"], producer, Arc::new(NoTransforms));

    let view = result.view(ViewConfiguration::new().component_filter(|id| *id != ComponentIdentifier::project(":a")));

    assert_eq!(
        view.files().collect::<anyhow::Result<Vec<_>>>().unwrap(),
        vec![PathBuf::from("build/c.jar"), PathBuf::from("build/b.jar")]
    );
}
