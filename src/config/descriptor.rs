//! The `cmeta.toml` project descriptor.
//!
//! The descriptor is plain data: every section deserializes into one of the structs
//! below with kebab-case keys. Turning it into live collaborators is the job of
//! [`ProjectWorkspace`](crate::config::ProjectWorkspace).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::core::{AttributeContainer, CmetaError};
use crate::identity::DEFAULT_STATUS;
use crate::rules::InputType;

/// Parsed `cmeta.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectDescriptor {
    /// The resolving project
    pub project: ProjectSection,
    /// Attribute schema of the project
    #[serde(default)]
    pub schema: SchemaSection,
    /// Configurations, in declaration order
    #[serde(default)]
    pub configurations: Vec<ConfigurationSection>,
    /// Locked module versions per configuration
    #[serde(default)]
    pub locks: BTreeMap<String, Vec<String>>,
    /// External component metadata to normalise with the rules
    #[serde(default)]
    pub components: Vec<ComponentSection>,
    /// Component metadata rules, in application order
    #[serde(default)]
    pub rules: Vec<RuleSection>,
    /// Module replacement declarations
    #[serde(default)]
    pub replacements: Vec<ReplacementSection>,
    /// Sibling projects that project dependencies resolve to
    #[serde(default)]
    pub projects: Vec<SiblingProjectSection>,
    /// Declared artifact transforms
    #[serde(default)]
    pub transforms: Vec<TransformSection>,
    /// Where external module artifacts live
    #[serde(default)]
    pub repository: RepositorySection,
}

/// `[project]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectSection {
    /// Module group
    pub group: String,
    /// Module name
    pub name: String,
    /// Module version
    pub version: String,
    /// Status label
    #[serde(default = "default_status")]
    pub status: String,
    /// Project path such as `:app`; absent when resolving outside a project
    pub path: Option<String>,
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// `[schema]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SchemaSection {
    /// Declared attribute names
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// `[[configurations]]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigurationSection {
    /// Configuration name
    pub name: String,
    /// Resolution attributes
    #[serde(default)]
    pub attributes: AttributeContainer,
    /// Whether dependency locking applies
    #[serde(default)]
    pub dependency_locking: bool,
    /// `group:name:version` or `:project` notations
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// File dependencies, relative to the descriptor
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Published artifacts
    #[serde(default)]
    pub artifacts: Vec<ArtifactSection>,
}

/// An artifact entry of a configuration or sibling project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ArtifactSection {
    /// File name
    pub name: String,
    /// Attributes of the artifact
    #[serde(default)]
    pub attributes: AttributeContainer,
}

/// Descriptor format of a declared component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentFormat {
    /// Ivy descriptor
    Ivy,
    /// Maven POM
    #[default]
    Maven,
    /// Gradle module metadata
    Gradle,
}

/// `[[components]]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ComponentSection {
    /// `group:name:version`
    pub id: String,
    /// Descriptor format
    #[serde(default)]
    pub format: ComponentFormat,
    /// Status as published
    pub status: Option<String>,
    /// Status scheme as published
    pub status_scheme: Option<Vec<String>>,
    /// Whether the module is changing
    #[serde(default)]
    pub changing: bool,
    /// Published attributes
    #[serde(default)]
    pub attributes: AttributeContainer,
    /// Ivy branch
    pub branch: Option<String>,
    /// Ivy `<info>` extra elements
    #[serde(default)]
    pub extra_info: BTreeMap<String, String>,
    /// Maven packaging
    pub packaging: Option<String>,
}

/// Extra input a declarative rule asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequiredInput {
    /// The Ivy descriptor of the component
    IvyDescriptor,
    /// The Maven POM of the component
    PomDescriptor,
}

impl From<RequiredInput> for InputType {
    fn from(input: RequiredInput) -> Self {
        match input {
            RequiredInput::IvyDescriptor => Self::IvyModuleDescriptor,
            RequiredInput::PomDescriptor => Self::PomDescriptor,
        }
    }
}

/// `[[rules]]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuleSection {
    /// Glob over `group:name`; absent means every component
    pub module: Option<String>,
    /// Extra inputs; the rule is skipped for components that cannot supply them
    #[serde(default)]
    pub requires: Vec<RequiredInput>,
    /// Replace the status
    pub set_status: Option<String>,
    /// Append to the status
    pub append_status: Option<String>,
    /// Use the Ivy branch as status when there is one
    #[serde(default)]
    pub status_from_branch: bool,
    /// Replace the status scheme
    pub status_scheme: Option<Vec<String>>,
    /// Mark the component changing or not
    pub changing: Option<bool>,
    /// Attributes to set
    #[serde(default)]
    pub attributes: AttributeContainer,
}

/// `[[replacements]]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ReplacementSection {
    /// Replaced module, `group:name`
    pub module: String,
    /// Replacing module, `group:name`
    pub replaced_by: String,
    /// Why
    pub reason: Option<String>,
}

/// `[[projects]]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SiblingProjectSection {
    /// Project path such as `:lib`
    pub path: String,
    /// Artifacts the project builds
    #[serde(default)]
    pub artifacts: Vec<ArtifactSection>,
}

/// `[[transforms]]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TransformSection {
    /// Attributes an input artifact must have
    pub from: AttributeContainer,
    /// Attributes the output has
    pub to: AttributeContainer,
    /// Appended to the input file stem to name the output
    pub suffix: String,
}

/// `[repository]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RepositorySection {
    /// Artifact directory, relative to the descriptor
    #[serde(default = "default_repository_dir")]
    pub dir: PathBuf,
}

impl Default for RepositorySection {
    fn default() -> Self {
        Self {
            dir: default_repository_dir(),
        }
    }
}

fn default_repository_dir() -> PathBuf {
    PathBuf::from("repo")
}

impl ProjectDescriptor {
    /// Read and parse the descriptor at `path`.
    ///
    /// # Errors
    ///
    /// - [`CmetaError::DescriptorNotFound`] if nothing exists at `path`
    /// - [`CmetaError::DescriptorParseError`] for invalid TOML or unknown keys and values
    pub async fn load(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Err(CmetaError::DescriptorNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read project descriptor {}", path.display()))?;
        let descriptor = Self::parse(&content, path)?;
        debug!(
            "Loaded {} with {} configuration(s) and {} rule(s)",
            path.display(),
            descriptor.configurations.len(),
            descriptor.rules.len()
        );
        Ok(descriptor)
    }

    /// Parse descriptor text; `origin` is only used in error messages.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            CmetaError::DescriptorParseError {
                file: origin.display().to_string(),
                reason: e.message().to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL: &str = r#"
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
dependencies = ["org.example:lib:2.0", ":core"]
files = ["libs/local.jar"]
artifacts = [{ name = "app.jar", attributes = { type = "jar" } }]

[locks]
runtime = ["org.example:lib:2.0"]

[[components]]
id = "org.ivy:mod:1.0"
format = "ivy"
branch = "main"
extra-info = { "ns:owner" = "team-a" }

[[rules]]
module = "org.ivy:*"
requires = ["ivy-descriptor"]
status-from-branch = true
status-scheme = ["integration", "main", "release"]

[[replacements]]
module = "org.old:lib"
replaced-by = "org.new:lib"

[[projects]]
path = ":core"
artifacts = [{ name = "core.jar", attributes = { type = "jar" } }]

[[transforms]]
from = { type = "jar" }
to = { type = "classes" }
suffix = "-classes"
"#;

    #[test]
    fn test_parse_full_descriptor() {
        let descriptor = ProjectDescriptor::parse(FULL, Path::new("cmeta.toml")).unwrap();
        assert_eq!(descriptor.project.status, "integration");
        assert_eq!(descriptor.project.path.as_deref(), Some(":app"));
        assert_eq!(descriptor.configurations[0].dependencies.len(), 2);
        assert!(descriptor.configurations[0].dependency_locking);
        assert_eq!(descriptor.components[0].format, ComponentFormat::Ivy);
        assert_eq!(descriptor.rules[0].requires, vec![RequiredInput::IvyDescriptor]);
        assert_eq!(descriptor.replacements[0].replaced_by, "org.new:lib");
        assert_eq!(descriptor.transforms[0].to.get("type"), Some("classes"));
        assert_eq!(descriptor.repository.dir, PathBuf::from("repo"));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let content = r#"
[project]
group = "g"
name = "n"
version = "1"

[[components]]
id = "g:m:1"
format = "npm"
"#;
        let err = ProjectDescriptor::parse(content, Path::new("cmeta.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CmetaError>(),
            Some(CmetaError::DescriptorParseError { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_missing_descriptor() {
        let temp = TempDir::new().unwrap();
        let err = ProjectDescriptor::load(&temp.path().join("cmeta.toml")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CmetaError>(),
            Some(CmetaError::DescriptorNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cmeta.toml");
        tokio::fs::write(&path, FULL).await.unwrap();
        let descriptor = ProjectDescriptor::load(&path).await.unwrap();
        assert_eq!(descriptor.project.name, "app");
    }
}
