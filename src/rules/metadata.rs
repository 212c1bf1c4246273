//! External component metadata as seen and edited by rules.
//!
//! [`MutableModuleComponentMetadata`] is the raw metadata of a resolved external module.
//! Its [`MetadataFormat`] tag records which descriptor format it came from, and
//! [`MutableModuleComponentMetadata::input`] answers whether that format can supply a
//! given extra rule input. Rules never touch the metadata directly: they observe and edit
//! it through the [`ComponentMetadataDetails`] façade.

use std::collections::BTreeMap;

use crate::core::AttributeContainer;
use crate::identity::{ComponentIdentifier, ModuleVersionIdentifier};
use crate::rules::action::{InputType, IvyModuleDescriptor, RuleInput};

/// Status scheme used when a descriptor declares none.
pub const DEFAULT_STATUS_SCHEME: [&str; 3] = ["integration", "milestone", "release"];

/// Descriptor format of an external component, with its format-specific data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataFormat {
    /// Ivy descriptor
    Ivy {
        /// Branch attribute of the descriptor
        branch: Option<String>,
        /// `<info>` extra elements, keyed by qualified name
        extra_info: BTreeMap<String, String>,
    },
    /// Maven POM
    Maven {
        /// POM packaging (e.g., "jar", "pom")
        packaging: String,
    },
    /// Gradle module metadata
    Gradle,
}

impl MetadataFormat {
    /// Short format name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ivy {
                ..
            } => "ivy",
            Self::Maven {
                ..
            } => "maven",
            Self::Gradle => "gradle",
        }
    }
}

/// Resolved metadata of an external component, mutable while rules run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutableModuleComponentMetadata {
    id: ModuleVersionIdentifier,
    status: String,
    status_scheme: Vec<String>,
    changing: bool,
    attributes: AttributeContainer,
    format: MetadataFormat,
}

impl MutableModuleComponentMetadata {
    /// Metadata with the default status and status scheme.
    pub fn new(id: ModuleVersionIdentifier, format: MetadataFormat) -> Self {
        Self {
            id,
            status: DEFAULT_STATUS_SCHEME[0].to_string(),
            status_scheme: DEFAULT_STATUS_SCHEME.iter().map(ToString::to_string).collect(),
            changing: false,
            attributes: AttributeContainer::new(),
            format,
        }
    }

    /// Metadata parsed from an Ivy descriptor with no branch or extra info.
    pub fn ivy(id: ModuleVersionIdentifier) -> Self {
        Self::new(
            id,
            MetadataFormat::Ivy {
                branch: None,
                extra_info: BTreeMap::new(),
            },
        )
    }

    /// Metadata parsed from a POM with `jar` packaging.
    pub fn maven(id: ModuleVersionIdentifier) -> Self {
        Self::new(
            id,
            MetadataFormat::Maven {
                packaging: "jar".to_string(),
            },
        )
    }

    /// Builder-style status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Builder-style status scheme.
    #[must_use]
    pub fn with_status_scheme(mut self, scheme: Vec<String>) -> Self {
        self.status_scheme = scheme;
        self
    }

    /// Builder-style changing flag.
    #[must_use]
    pub fn with_changing(mut self, changing: bool) -> Self {
        self.changing = changing;
        self
    }

    /// Builder-style attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributeContainer) -> Self {
        self.attributes = attributes;
        self
    }

    /// Module coordinates.
    pub fn id(&self) -> &ModuleVersionIdentifier {
        &self.id
    }

    /// Component identifier of the module.
    pub fn component_id(&self) -> ComponentIdentifier {
        ComponentIdentifier::Module(self.id.clone())
    }

    /// Current status.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Current status scheme.
    pub fn status_scheme(&self) -> &[String] {
        &self.status_scheme
    }

    /// Whether the module may change without a version change.
    pub fn is_changing(&self) -> bool {
        self.changing
    }

    /// Current attributes.
    pub fn attributes(&self) -> &AttributeContainer {
        &self.attributes
    }

    /// Descriptor format.
    pub fn format(&self) -> &MetadataFormat {
        &self.format
    }

    /// Produce the extra rule input of type `input_type`, if this format can supply it.
    pub fn input(&self, input_type: InputType) -> Option<RuleInput> {
        match (input_type, &self.format) {
            (
                InputType::IvyModuleDescriptor,
                MetadataFormat::Ivy {
                    branch,
                    extra_info,
                },
            ) => Some(RuleInput::IvyModuleDescriptor(IvyModuleDescriptor {
                extra_info: extra_info.clone(),
                branch: branch.clone(),
                ivy_status: self.status.clone(),
            })),
            _ => None,
        }
    }
}

/// The view of a component's metadata that rules observe and edit.
pub struct ComponentMetadataDetails<'a> {
    metadata: &'a mut MutableModuleComponentMetadata,
}

impl<'a> ComponentMetadataDetails<'a> {
    /// Wrap `metadata` for editing.
    pub fn new(metadata: &'a mut MutableModuleComponentMetadata) -> Self {
        Self {
            metadata,
        }
    }

    /// Module coordinates.
    pub fn id(&self) -> &ModuleVersionIdentifier {
        self.metadata.id()
    }

    /// Current status.
    pub fn status(&self) -> &str {
        self.metadata.status()
    }

    /// Replace the status.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.metadata.status = status.into();
    }

    /// Current status scheme.
    pub fn status_scheme(&self) -> &[String] {
        self.metadata.status_scheme()
    }

    /// Replace the status scheme.
    pub fn set_status_scheme(&mut self, scheme: Vec<String>) {
        self.metadata.status_scheme = scheme;
    }

    /// Whether the module may change without a version change.
    pub fn is_changing(&self) -> bool {
        self.metadata.is_changing()
    }

    /// Mark the module as changing or not.
    pub fn set_changing(&mut self, changing: bool) {
        self.metadata.changing = changing;
    }

    /// Current attributes.
    pub fn attributes(&self) -> &AttributeContainer {
        self.metadata.attributes()
    }

    /// Set one attribute.
    pub fn attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.attributes.insert(key, value);
    }
}
