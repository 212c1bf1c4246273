//! Live collaborators assembled from a project descriptor.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::artifacts::{
    ArtifactProducer, ResolutionResult, ResolvableArtifact, ResolvedComponent, TransformPipeline,
};
use crate::config::descriptor::{
    ArtifactSection, ComponentFormat, ComponentSection, ProjectDescriptor, TransformSection,
};
use crate::config::rules::DeclarativeRule;
use crate::core::{AttributeContainer, CmetaError};
use crate::identity::{ComponentArtifactIdentifier, ComponentIdentifier, Module, ModuleVersionIdentifier};
use crate::project::{
    AttributesSchema, ConfigurationContainer, DependencyDeclaration, DependencyMetaDataProvider,
    DependencyTarget, InMemoryLockingProvider, ProjectIdentity, ProjectRegistry, ProjectState, PublishArtifact,
};
use crate::root::RootComponentMetadataBuilder;
use crate::rules::{ComponentMetadataHandler, MetadataFormat, MutableModuleComponentMetadata};

/// Attribute naming the packaging of an artifact.
pub const ARTIFACT_TYPE: &str = "type";

/// Transforms declared in `[[transforms]]`.
///
/// A transform applies when the input artifact carries its `from` attributes and its
/// output satisfies the requested attributes. Output files are named after the input
/// with the transform's suffix added to the file stem; nothing is written to disk.
#[derive(Debug, Default)]
pub struct DeclaredTransforms {
    transforms: Vec<TransformSection>,
}

impl DeclaredTransforms {
    /// Pipeline over `transforms`, tried in declaration order.
    pub fn new(transforms: Vec<TransformSection>) -> Self {
        Self {
            transforms,
        }
    }

    fn find(&self, from: &AttributeContainer, to: &AttributeContainer) -> Option<&TransformSection> {
        self.transforms.iter().find(|t| {
            has_all(from, &t.from) && from.merged(&t.to).is_compatible_with(to)
        })
    }
}

/// Whether `attributes` carries every entry of `required`.
fn has_all(attributes: &AttributeContainer, required: &AttributeContainer) -> bool {
    required.iter().all(|(key, value)| attributes.get(key) == Some(value))
}

impl TransformPipeline for DeclaredTransforms {
    fn can_transform(&self, from: &AttributeContainer, to: &AttributeContainer) -> bool {
        self.find(from, to).is_some()
    }

    fn transform(
        &self,
        artifact: &ComponentArtifactIdentifier,
        file: &Path,
        from: &AttributeContainer,
        to: &AttributeContainer,
    ) -> Result<Vec<PathBuf>> {
        let transform = self.find(from, to).ok_or_else(|| CmetaError::TransformFailed {
            artifact: artifact.to_string(),
            requested: to.clone(),
            reason: format!("no transform from {from}"),
        })?;

        let stem = file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let name = match file.extension() {
            Some(ext) => format!("{stem}{}.{}", transform.suffix, ext.to_string_lossy()),
            None => format!("{stem}{}", transform.suffix),
        };
        let output = file.with_file_name(name);
        debug!("Transformed {} into {}", file.display(), output.display());
        Ok(vec![output])
    }
}

/// "Builds" sibling project artifacts into `<base>/build/<project>/libs/`.
///
/// The path is computed, not written; the descriptor models build outputs only.
#[derive(Debug)]
pub struct ProjectArtifactProducer {
    base_dir: PathBuf,
}

impl ProjectArtifactProducer {
    /// Producer rooted at the descriptor directory.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl ArtifactProducer for ProjectArtifactProducer {
    fn produce(&self, artifact: &ComponentArtifactIdentifier) -> Result<PathBuf> {
        let ComponentIdentifier::Project {
            path,
        } = &artifact.component
        else {
            return Err(CmetaError::ArtifactBuildFailed {
                artifact: artifact.to_string(),
                reason: "only project artifacts can be built".to_string(),
            }
            .into());
        };

        info!("Building {}", artifact);
        let mut dir = self.base_dir.join("build");
        for segment in path.split(':').filter(|s| !s.is_empty()) {
            dir.push(segment);
        }
        Ok(dir.join("libs").join(&artifact.name))
    }
}

/// Everything a `cmeta.toml` describes, wired together.
pub struct ProjectWorkspace {
    descriptor: ProjectDescriptor,
    base_dir: PathBuf,
    identity: Arc<ProjectIdentity>,
    configurations: Arc<ConfigurationContainer>,
    root: RootComponentMetadataBuilder,
    handler: ComponentMetadataHandler,
    pipeline: Arc<DeclaredTransforms>,
    producer: Arc<ProjectArtifactProducer>,
}

impl ProjectWorkspace {
    /// Load the descriptor at `path` and assemble the workspace around it.
    pub async fn load(path: &Path) -> Result<Self> {
        let descriptor = ProjectDescriptor::load(path).await?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_descriptor(descriptor, base_dir)
    }

    /// Assemble a workspace; relative paths are resolved against `base_dir`.
    pub fn from_descriptor(descriptor: ProjectDescriptor, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        let project = &descriptor.project;

        let mut module = Module::new(&project.group, &project.name, &project.version)
            .with_status(&project.status);
        if let Some(path) = &project.path {
            let _: ComponentIdentifier = path.parse()?;
            module = module.with_project_path(path);
        }
        let identity = Arc::new(ProjectIdentity::new(module));

        let mut registry = ProjectRegistry::new();
        if let Some(path) = &project.path {
            let schema = descriptor
                .schema
                .attributes
                .iter()
                .fold(AttributesSchema::new(), |schema, name| schema.with_attribute(name));
            let mut locking = InMemoryLockingProvider::new();
            for (configuration, versions) in &descriptor.locks {
                let versions = versions
                    .iter()
                    .map(|v| v.parse::<ModuleVersionIdentifier>())
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("Invalid lock entry for configuration '{configuration}'"))?;
                locking.lock(configuration.clone(), versions);
            }
            registry.register(ProjectState::new(path).with_schema(schema).with_locking(Arc::new(locking)));
        }
        for sibling in &descriptor.projects {
            registry.register(ProjectState::new(&sibling.path));
        }

        let configurations = Arc::new(ConfigurationContainer::new());
        let root = RootComponentMetadataBuilder::new(identity.clone(), Arc::new(registry), configurations.clone());
        configurations.add_validator(root.validator());

        for section in &descriptor.configurations {
            configurations.create(&section.name)?;
            for (key, value) in section.attributes.iter() {
                configurations.set_attribute(&section.name, key, value)?;
            }
            for notation in &section.dependencies {
                configurations.add_dependency(&section.name, DependencyDeclaration::parse(notation)?)?;
            }
            for file in &section.files {
                configurations.add_dependency(&section.name, DependencyDeclaration::file(file))?;
            }
            for artifact in &section.artifacts {
                configurations.add_artifact(
                    &section.name,
                    PublishArtifact::new(&artifact.name, artifact.attributes.clone()),
                )?;
            }
            if section.dependency_locking {
                configurations.set_dependency_locking(&section.name, true)?;
            }
        }

        let mut handler = ComponentMetadataHandler::new();
        for (index, section) in descriptor.rules.iter().enumerate() {
            handler.add_rule(None, Arc::new(DeclarativeRule::new(index, section.clone())?))?;
        }
        for replacement in &descriptor.replacements {
            let mut details = handler.module(&replacement.module)?;
            match &replacement.reason {
                Some(reason) => details.replaced_by_because(&replacement.replaced_by, reason)?,
                None => details.replaced_by(&replacement.replaced_by)?,
            }
        }

        let pipeline = Arc::new(DeclaredTransforms::new(descriptor.transforms.clone()));
        let producer = Arc::new(ProjectArtifactProducer::new(&base_dir));
        debug!(
            "Assembled workspace for {} with {} rule(s)",
            identity.module().version_identifier(),
            handler.rule_count()
        );

        Ok(Self {
            descriptor,
            base_dir,
            identity,
            configurations,
            root,
            handler,
            pipeline,
            producer,
        })
    }

    /// The parsed descriptor.
    pub fn descriptor(&self) -> &ProjectDescriptor {
        &self.descriptor
    }

    /// The project's identity.
    pub fn identity(&self) -> &Arc<ProjectIdentity> {
        &self.identity
    }

    /// The configuration registry.
    pub fn configurations(&self) -> &Arc<ConfigurationContainer> {
        &self.configurations
    }

    /// The root metadata builder, registered for mutation notifications.
    pub fn root_builder(&self) -> &RootComponentMetadataBuilder {
        &self.root
    }

    /// Registered rules and replacements.
    pub fn handler(&self) -> &ComponentMetadataHandler {
        &self.handler
    }

    /// Metadata of every `[[components]]` entry, before any rule runs.
    pub fn components(&self) -> Result<Vec<MutableModuleComponentMetadata>> {
        self.descriptor.components.iter().map(component_metadata).collect()
    }

    /// Resolve `configuration` one level deep: each declared dependency becomes a
    /// component whose artifacts are located or built lazily.
    pub fn resolve(&self, configuration: &str) -> Result<ResolutionResult> {
        let config = self.configurations.get(configuration).ok_or_else(|| {
            CmetaError::ConfigurationNotFound {
                name: configuration.to_string(),
            }
        })?;

        let components = config
            .dependencies
            .iter()
            .map(|dependency| self.resolve_dependency(dependency))
            .collect::<Result<Vec<_>>>()?;
        debug!("Resolved {} to {} component(s)", configuration, components.len());

        Ok(ResolutionResult::new(
            configuration,
            config.attributes.clone(),
            components,
            self.pipeline.clone(),
        ))
    }

    fn resolve_dependency(&self, dependency: &DependencyDeclaration) -> Result<ResolvedComponent> {
        match &dependency.target {
            DependencyTarget::Module(id) => {
                let component = ComponentIdentifier::Module(id.clone());
                let name = format!("{}-{}.jar", id.name(), id.version);
                let file = self.base_dir.join(&self.descriptor.repository.dir).join(id.group()).join(&name);
                Ok(ResolvedComponent::new(
                    component.clone(),
                    vec![ResolvableArtifact::file(
                        ComponentArtifactIdentifier::new(component, name),
                        AttributeContainer::new().with(ARTIFACT_TYPE, "jar"),
                        file,
                    )],
                ))
            }
            DependencyTarget::Project {
                path,
            } => {
                let sibling = self.descriptor.projects.iter().find(|p| &p.path == path).ok_or_else(|| {
                    CmetaError::Other {
                        message: format!("Project {path} is not declared in [[projects]]"),
                    }
                })?;
                let component = ComponentIdentifier::project(path);
                Ok(ResolvedComponent::new(
                    component.clone(),
                    sibling.artifacts.iter().map(|a| self.project_artifact(&component, a)).collect(),
                ))
            }
            DependencyTarget::File(path) => {
                let name = path
                    .file_name()
                    .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
                // Keyed by the declared path: two files may share a name.
                let component = ComponentIdentifier::opaque(path.display().to_string());
                Ok(ResolvedComponent::new(
                    component.clone(),
                    vec![ResolvableArtifact::file(
                        ComponentArtifactIdentifier::new(component, name),
                        file_attributes(path),
                        self.base_dir.join(path),
                    )],
                ))
            }
        }
    }

    fn project_artifact(&self, component: &ComponentIdentifier, artifact: &ArtifactSection) -> ResolvableArtifact {
        ResolvableArtifact::produced(
            ComponentArtifactIdentifier::new(component.clone(), &artifact.name),
            artifact.attributes.clone(),
            self.producer.clone(),
        )
    }
}

/// Attributes of a plain file: its extension is its artifact type.
pub(crate) fn file_attributes(path: &Path) -> AttributeContainer {
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default();
    AttributeContainer::new().with(ARTIFACT_TYPE, extension)
}

fn component_metadata(section: &ComponentSection) -> Result<MutableModuleComponentMetadata> {
    let id: ModuleVersionIdentifier = section.id.parse()?;
    let format = match section.format {
        ComponentFormat::Ivy => MetadataFormat::Ivy {
            branch: section.branch.clone(),
            extra_info: section.extra_info.clone(),
        },
        ComponentFormat::Maven => MetadataFormat::Maven {
            packaging: section.packaging.clone().unwrap_or_else(|| "jar".to_string()),
        },
        ComponentFormat::Gradle => MetadataFormat::Gradle,
    };

    let mut metadata = MutableModuleComponentMetadata::new(id, format)
        .with_changing(section.changing)
        .with_attributes(section.attributes.clone());
    if let Some(status) = &section.status {
        metadata = metadata.with_status(status);
    }
    if let Some(scheme) = &section.status_scheme {
        metadata = metadata.with_status_scheme(scheme.clone());
    }
    Ok(metadata)
}
