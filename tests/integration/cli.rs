//! The `cmeta` binary against descriptor fixtures.

use predicates::prelude::*;

use cmeta_cli::test_utils::DescriptorFixture;

use crate::common::cmeta;

#[test]
fn test_root_json() {
    let fixture = DescriptorFixture::sample().unwrap();

    let output = cmeta(fixture.dir()).args(["root", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["id"], "org.example:app:1.0");
    assert_eq!(json["configurations"][0]["name"], "runtime");
    assert_eq!(json["configurations"][0]["locked"][0], "org.example:lib:2.0");
    assert_eq!(json["configurations"][1]["locked"].as_array().unwrap().len(), 0);
}

#[test]
fn test_root_selected_configuration() {
    let fixture = DescriptorFixture::sample().unwrap();

    cmeta(fixture.dir())
        .args(["root", "-c", "compile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("org.example:api:1.0"))
        .stdout(predicate::str::contains("org.example:lib:2.0").not());
}

#[test]
fn test_rules_report() {
    let fixture = DescriptorFixture::sample().unwrap();

    cmeta(fixture.dir())
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("org.ivy:mod:1.0 [ivy] release"))
        .stdout(predicate::str::contains("org.maven:lib:3.1 [maven] milestone"))
        .stdout(predicate::str::contains("org.old:lib replaced by org.maven:lib (renamed)"));
}

#[test]
fn test_view_transforms_included_project() {
    let fixture = DescriptorFixture::sample().unwrap();

    cmeta(fixture.dir())
        .args(["view", "runtime", "--include", ":a", "--attribute", "type=classes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a-classes.jar"))
        .stdout(predicate::str::contains("b-classes.jar").not());
}

#[test]
fn test_manifest_path_from_elsewhere() {
    let fixture = DescriptorFixture::sample().unwrap();
    let elsewhere = tempfile::TempDir::new().unwrap();

    cmeta(elsewhere.path())
        .arg("--manifest-path")
        .arg(fixture.descriptor_path())
        .args(["view", "runtime", "--include", ":b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("b.jar"));
}

#[test]
fn test_unknown_configuration_fails() {
    let fixture = DescriptorFixture::sample().unwrap();

    cmeta(fixture.dir())
        .args(["view", "nope"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration 'nope' not found"));
}

#[test]
fn test_missing_descriptor() {
    let empty = tempfile::TempDir::new().unwrap();

    cmeta(empty.path())
        .arg("root")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Project descriptor not found"));
}

#[test]
fn test_invalid_attribute_argument() {
    let fixture = DescriptorFixture::sample().unwrap();

    cmeta(fixture.dir())
        .args(["view", "runtime", "--attribute", "type"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key=value"));
}
