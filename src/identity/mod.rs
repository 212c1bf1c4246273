//! Component identity value types.
//!
//! These types identify the participants of a dependency graph:
//!
//! - [`Module`] - the coordinates and status of the project being resolved, as reported
//!   by the current project identity provider
//! - [`ModuleIdentifier`] - `group:name`, the key for module replacements
//! - [`ModuleVersionIdentifier`] - `group:name:version`
//! - [`ComponentIdentifier`] - an external module, a local project, or an opaque file
//!   dependency; the root metadata cache key and the artifact view filter input
//! - [`ComponentArtifactIdentifier`] - one artifact produced by a component
//!
//! All identifiers use structural equality.
//!
//! # Notation
//!
//! ```
//! use cmeta_cli::identity::ComponentIdentifier;
//!
//! let module: ComponentIdentifier = "org.example:lib:1.0".parse().unwrap();
//! assert_eq!(module.to_string(), "org.example:lib:1.0");
//!
//! let project: ComponentIdentifier = ":app".parse().unwrap();
//! assert_eq!(project.to_string(), "project :app");
//! ```

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::core::CmetaError;

/// The status modules get when nothing else is specified.
pub const DEFAULT_STATUS: &str = "integration";

/// Coordinates of the module a project publishes as.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Module {
    /// Module group (e.g., "org.example")
    pub group: String,
    /// Module name
    pub name: String,
    /// Module version
    pub version: String,
    /// Owning project path (e.g., ":app"); `None` outside any project context
    pub project_path: Option<String>,
    /// Status label (e.g., "integration", "release")
    pub status: String,
}

impl Module {
    /// Create a module outside any project context with the default status.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            project_path: None,
            status: DEFAULT_STATUS.to_string(),
        }
    }

    /// Attach the module to a project path.
    #[must_use]
    pub fn with_project_path(mut self, path: impl Into<String>) -> Self {
        self.project_path = Some(path.into());
        self
    }

    /// Replace the status label.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// `group:name:version` of this module.
    pub fn version_identifier(&self) -> ModuleVersionIdentifier {
        ModuleVersionIdentifier::new(&self.group, &self.name, &self.version)
    }

    /// The component identifier this module is resolved as.
    ///
    /// A module owned by a project is identified by the project path; otherwise by its
    /// module coordinates.
    pub fn component_identifier(&self) -> ComponentIdentifier {
        match &self.project_path {
            Some(path) => ComponentIdentifier::project(path.clone()),
            None => ComponentIdentifier::Module(self.version_identifier()),
        }
    }
}

/// `group:name` of a module, independent of version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModuleIdentifier {
    /// Module group
    pub group: String,
    /// Module name
    pub name: String,
}

impl ModuleIdentifier {
    /// Create a module identifier.
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

impl FromStr for ModuleIdentifier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, name] if !group.is_empty() && !name.is_empty() => Ok(Self::new(*group, *name)),
            _ => Err(invalid_notation(s, "expected 'group:name'")),
        }
    }
}

/// `group:name:version` of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModuleVersionIdentifier {
    /// Group and name
    pub module: ModuleIdentifier,
    /// Version
    pub version: String,
}

impl ModuleVersionIdentifier {
    /// Create a module version identifier.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            module: ModuleIdentifier::new(group, name),
            version: version.into(),
        }
    }

    /// Module group.
    pub fn group(&self) -> &str {
        &self.module.group
    }

    /// Module name.
    pub fn name(&self) -> &str {
        &self.module.name
    }
}

impl fmt::Display for ModuleVersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.version)
    }
}

impl FromStr for ModuleVersionIdentifier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, name, version]
                if !group.is_empty() && !name.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(*group, *name, *version))
            }
            _ => Err(invalid_notation(s, "expected 'group:name:version'")),
        }
    }
}

/// Identity of a component in a dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ComponentIdentifier {
    /// An external published module
    Module(ModuleVersionIdentifier),
    /// A local project, identified by its path (e.g., ":app")
    Project {
        /// Project path
        path: String,
    },
    /// A file dependency with no identity beyond its display name
    Opaque {
        /// Synthetic display name, usually the declared file path
        display_name: String,
    },
}

impl ComponentIdentifier {
    /// Identifier for the project at `path`.
    pub fn project(path: impl Into<String>) -> Self {
        Self::Project {
            path: path.into(),
        }
    }

    /// Synthetic identifier for a file dependency.
    pub fn opaque(display_name: impl Into<String>) -> Self {
        Self::Opaque {
            display_name: display_name.into(),
        }
    }

    /// Whether this is a local project component.
    pub fn is_project(&self) -> bool {
        matches!(self, Self::Project { .. })
    }

    /// Module coordinates, for external module components.
    pub fn module_version(&self) -> Option<&ModuleVersionIdentifier> {
        match self {
            Self::Module(id) => Some(id),
            _ => None,
        }
    }

    /// Human-readable name, as shown in logs and error messages.
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(id) => write!(f, "{id}"),
            Self::Project {
                path,
            } => write!(f, "project {path}"),
            Self::Opaque {
                display_name,
            } => write!(f, "{display_name}"),
        }
    }
}

impl FromStr for ComponentIdentifier {
    type Err = anyhow::Error;

    /// Parses `group:name:version` or a project path starting with `:`.
    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with(':') {
            if s.len() == 1 || s.ends_with(':') || s.contains("::") {
                return Err(invalid_notation(s, "project paths look like ':app' or ':libs:core'"));
            }
            return Ok(Self::project(s));
        }
        Ok(Self::Module(s.parse()?))
    }
}

/// One artifact produced by a component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ComponentArtifactIdentifier {
    /// The owning component
    pub component: ComponentIdentifier,
    /// Artifact file name (e.g., "lib-1.0.jar")
    pub name: String,
}

impl ComponentArtifactIdentifier {
    /// Create an artifact identifier.
    pub fn new(component: ComponentIdentifier, name: impl Into<String>) -> Self {
        Self {
            component,
            name: name.into(),
        }
    }
}

impl fmt::Display for ComponentArtifactIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.component {
            ComponentIdentifier::Opaque {
                ..
            } => write!(f, "{}", self.name),
            component => write!(f, "{} ({component})", self.name),
        }
    }
}

fn invalid_notation(notation: &str, reason: &str) -> anyhow::Error {
    CmetaError::InvalidModuleNotation {
        notation: notation.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_identifier_for_module() {
        let module = Module::new("org.example", "app", "1.0");
        assert_eq!(
            module.component_identifier(),
            ComponentIdentifier::Module(ModuleVersionIdentifier::new("org.example", "app", "1.0"))
        );

        let module = module.with_project_path(":app");
        assert_eq!(module.component_identifier(), ComponentIdentifier::project(":app"));
    }

    #[test]
    fn test_identifiers_compare_structurally() {
        let a: ComponentIdentifier = "g:n:1".parse().unwrap();
        let b = ComponentIdentifier::Module(ModuleVersionIdentifier::new("g", "n", "1"));
        assert_eq!(a, b);
        assert_ne!(a, "g:n:2".parse::<ComponentIdentifier>().unwrap());
    }

    #[test]
    fn test_invalid_notations() {
        for notation in ["", "g:n", "g::1", ":", ":a:", "a:b:c:d"] {
            let err = notation.parse::<ComponentIdentifier>().unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<CmetaError>(),
                    Some(CmetaError::InvalidModuleNotation { .. })
                ),
                "{notation} should be rejected"
            );
        }
        assert!("g".parse::<ModuleIdentifier>().is_err());
        assert_eq!("g:n".parse::<ModuleIdentifier>().unwrap(), ModuleIdentifier::new("g", "n"));
    }

    #[test]
    fn test_artifact_display() {
        let id = ComponentArtifactIdentifier::new(ComponentIdentifier::project(":lib"), "lib.jar");
        assert_eq!(id.to_string(), "lib.jar (project :lib)");

        let file = ComponentArtifactIdentifier::new(ComponentIdentifier::opaque("local.jar"), "local.jar");
        assert_eq!(file.to_string(), "local.jar");
    }
}
