//! Component metadata rules applied through the handler and from descriptors.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use cmeta_cli::config::ProjectWorkspace;
use cmeta_cli::core::CmetaError;
use cmeta_cli::identity::{ModuleIdentifier, ModuleVersionIdentifier};
use cmeta_cli::rules::{
    ComponentMetadataHandler, InputType, MetadataFormat, ModuleReplacementsData,
    MutableModuleComponentMetadata, RuleAction,
};
use cmeta_cli::test_utils::{DescriptorFixture, init_test_logging};

fn id(notation: &str) -> ModuleVersionIdentifier {
    notation.parse().unwrap()
}

fn ivy_on_branch(notation: &str, branch: &str) -> MutableModuleComponentMetadata {
    MutableModuleComponentMetadata::new(
        id(notation),
        MetadataFormat::Ivy {
            branch: Some(branch.to_string()),
            extra_info: BTreeMap::new(),
        },
    )
}

#[test]
fn test_rules_run_in_registration_order() {
    init_test_logging(None);
    let mut handler = ComponentMetadataHandler::new();
    handler
        .all(Arc::new(RuleAction::new("first", |details, _| {
            details.attribute("trail", "a");
            Ok(())
        })))
        .unwrap()
        .all(Arc::new(RuleAction::new("second", |details, _| {
            let trail = format!("{}-b", details.attributes().get("trail").unwrap_or_default());
            details.attribute("trail", trail);
            Ok(())
        })))
        .unwrap();

    let mut metadata = MutableModuleComponentMetadata::maven(id("org:lib:1.0"));
    handler.process_metadata(&mut metadata).unwrap();

    assert_eq!(metadata.attributes().get("trail"), Some("a-b"));
}

#[test]
fn test_rule_without_available_input_is_skipped() {
    let ran = Arc::new(Mutex::new(Vec::new()));
    let seen = ran.clone();

    let mut handler = ComponentMetadataHandler::new();
    handler
        .all(Arc::new(
            RuleAction::new("branch status", move |details, inputs| {
                seen.lock().unwrap().push(details.id().to_string());
                let branch = inputs[0].as_ivy_descriptor().and_then(|ivy| ivy.branch.clone());
                if branch.as_deref() == Some("release") {
                    details.set_status("release");
                }
                Ok(())
            })
            .with_inputs(vec![InputType::IvyModuleDescriptor]),
        ))
        .unwrap();

    let mut maven = MutableModuleComponentMetadata::maven(id("org:maven:1.0"));
    handler.process_metadata(&mut maven).unwrap();
    assert_eq!(maven.status(), "integration");

    let mut ivy = ivy_on_branch("org:ivy:1.0", "release");
    handler.process_metadata(&mut ivy).unwrap();
    assert_eq!(ivy.status(), "release");

    assert_eq!(*ran.lock().unwrap(), vec!["org:ivy:1.0".to_string()]);
}

#[test]
fn test_status_must_belong_to_final_scheme() {
    let mut handler = ComponentMetadataHandler::new();
    handler
        .all(Arc::new(RuleAction::new("custom scheme", |details, _| {
            details.set_status_scheme(vec!["snapshot".to_string(), "gold".to_string()]);
            details.set_status("gold");
            Ok(())
        })))
        .unwrap();

    let mut metadata = MutableModuleComponentMetadata::maven(id("org:lib:1.0"));
    handler.process_metadata(&mut metadata).unwrap();
    assert_eq!(metadata.status(), "gold");

    let mut handler = ComponentMetadataHandler::new();
    handler
        .all(Arc::new(RuleAction::new("bad status", |details, _| {
            details.set_status("bronze");
            Ok(())
        })))
        .unwrap();

    let mut metadata = MutableModuleComponentMetadata::maven(id("org:lib:1.0"));
    let err = handler.process_metadata(&mut metadata).unwrap_err();
    match err.downcast_ref::<CmetaError>() {
        Some(CmetaError::UnexpectedStatus {
            status,
            component,
            ..
        }) => {
            assert_eq!(status, "bronze");
            assert_eq!(component, "org:lib:1.0");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("Unexpected status 'bronze' specified for org:lib:1.0"));
}

#[test]
fn test_unsupported_input_rejected_at_registration() {
    let mut handler = ComponentMetadataHandler::new();
    let err = handler
        .all(Arc::new(RuleAction::new("pom reader", |_, _| Ok(())).with_inputs(vec![InputType::PomDescriptor])))
        .err()
        .unwrap();

    assert!(matches!(
        err.downcast_ref::<CmetaError>(),
        Some(CmetaError::UnsupportedRuleInput { .. })
    ));
    assert_eq!(handler.rule_count(), 0);
}

#[test]
fn test_failing_rule_names_rule_and_component() {
    let mut handler = ComponentMetadataHandler::new();
    handler
        .all(Arc::new(RuleAction::new("broken", |_, _| Err(anyhow::anyhow!("no network")))))
        .unwrap();

    let mut metadata = MutableModuleComponentMetadata::maven(id("org:lib:1.0"));
    let err = handler.process_metadata(&mut metadata).unwrap_err();

    assert_eq!(err.to_string(), "Could not apply component metadata rule 'broken' to org:lib:1.0");
    assert!(format!("{err:#}").contains("no network"));
}

#[tokio::test]
async fn test_descriptor_rules_normalise_components() {
    let fixture = DescriptorFixture::sample().unwrap();
    let workspace = ProjectWorkspace::load(&fixture.descriptor_path()).await.unwrap();

    let mut components = workspace.components().unwrap();
    for component in &mut components {
        workspace.handler().process_metadata(component).unwrap();
    }

    let ivy = components.iter().find(|c| c.id().to_string() == "org.ivy:mod:1.0").unwrap();
    assert_eq!(ivy.status(), "release");
    assert!(!ivy.is_changing());
    assert_eq!(ivy.attributes().get("component.normalised"), Some("true"));

    let maven = components.iter().find(|c| c.id().to_string() == "org.maven:lib:3.1").unwrap();
    assert_eq!(maven.status(), "milestone");
    assert_eq!(maven.attributes().get("component.normalised"), Some("true"));
}

#[tokio::test]
async fn test_descriptor_replacements() {
    let fixture = DescriptorFixture::sample().unwrap();
    let workspace = ProjectWorkspace::load(&fixture.descriptor_path()).await.unwrap();

    let replacements = workspace.handler().module_replacements();
    let replacement = replacements.replacement_for(&ModuleIdentifier::new("org.old", "lib")).unwrap();
    assert_eq!(replacement.target, ModuleIdentifier::new("org.maven", "lib"));
    assert_eq!(replacement.reason.as_deref(), Some("renamed"));
    assert!(replacements.participates_in_replacements(&ModuleIdentifier::new("org.maven", "lib")));
}

#[test]
fn test_replacement_cycles_are_rejected() {
    let mut handler = ComponentMetadataHandler::new();
    handler.module("org:a").unwrap().replaced_by("org:b").unwrap();

    let err = handler.module("org:b").unwrap().replaced_by("org:a").unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CmetaError>(),
        Some(CmetaError::ReplacementCycle { .. })
    ));
    assert_eq!(handler.module_replacements().len(), 1);
}
