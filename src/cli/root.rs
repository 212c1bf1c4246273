//! `cmeta root`: show the root component metadata of the project.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::common::{OutputFormat, load_workspace, print_json};
use crate::core::{AttributeContainer, CmetaError};
use crate::identity::ComponentIdentifier;
use crate::project::{ConfigurationsProvider, NamedConfigurationsProvider};
use crate::root::RootLocalComponentMetadata;

/// Build and print the project's root component metadata.
#[derive(Args, Debug)]
pub struct RootCommand {
    /// Only include these configurations (repeatable)
    #[arg(short = 'c', long = "configuration")]
    configurations: Vec<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct RootSummary {
    id: String,
    component: ComponentIdentifier,
    status: String,
    schema: Option<Vec<String>>,
    configurations: Vec<ConfigurationSummary>,
}

#[derive(Debug, Serialize)]
struct ConfigurationSummary {
    name: String,
    attributes: AttributeContainer,
    dependencies: Vec<String>,
    artifacts: Vec<String>,
    locked: Vec<String>,
}

impl RootSummary {
    fn new(metadata: &RootLocalComponentMetadata) -> Self {
        Self {
            id: metadata.id().to_string(),
            component: metadata.component_id().clone(),
            status: metadata.status().to_string(),
            schema: metadata
                .attributes_schema()
                .map(|schema| schema.attributes().map(ToString::to_string).collect()),
            configurations: metadata
                .configurations()
                .iter()
                .map(|c| ConfigurationSummary {
                    name: c.name.clone(),
                    attributes: c.attributes.clone(),
                    dependencies: c.dependencies.iter().map(ToString::to_string).collect(),
                    artifacts: c.artifacts.iter().map(|a| a.name.clone()).collect(),
                    locked: c.locked_versions.iter().map(ToString::to_string).collect(),
                })
                .collect(),
        }
    }

    fn print(&self) {
        println!("{} ({})", self.id.bold(), self.component);
        println!("  status: {}", self.status);
        match &self.schema {
            Some(schema) if !schema.is_empty() => println!("  schema: {}", schema.join(", ")),
            Some(_) => println!("  schema: {}", "empty".dimmed()),
            None => println!("  schema: {}", "none".dimmed()),
        }
        for configuration in &self.configurations {
            println!("  {} {}", configuration.name.green(), configuration.attributes);
            for dependency in &configuration.dependencies {
                println!("    dependency {dependency}");
            }
            for artifact in &configuration.artifacts {
                println!("    artifact {artifact}");
            }
            for locked in &configuration.locked {
                println!("    locked {locked}");
            }
        }
    }
}

impl RootCommand {
    /// Run the command against the descriptor at `manifest_path`.
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        let workspace = load_workspace(manifest_path).await?;

        let metadata = if self.configurations.is_empty() {
            workspace.root_builder().to_root_metadata()?
        } else {
            for name in &self.configurations {
                if !workspace.configurations().contains(name) {
                    return Err(CmetaError::ConfigurationNotFound {
                        name: name.clone(),
                    }
                    .into());
                }
            }
            let source: Arc<dyn ConfigurationsProvider> = workspace.configurations().clone();
            let provider = NamedConfigurationsProvider::new(source, self.configurations.clone());
            workspace.root_builder().with_configurations_provider(Arc::new(provider)).to_root_metadata()?
        };

        let summary = RootSummary::new(&metadata);
        match self.format {
            OutputFormat::Json => print_json(&summary)?,
            OutputFormat::Text => summary.print(),
        }
        Ok(())
    }
}
