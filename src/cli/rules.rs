//! `cmeta rules`: apply the declared metadata rules to the declared components.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::common::{OutputFormat, load_workspace, print_json};
use crate::core::AttributeContainer;
use crate::rules::MutableModuleComponentMetadata;

/// Normalise every `[[components]]` entry with the `[[rules]]` tables.
#[derive(Args, Debug)]
pub struct RulesCommand {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct ComponentSummary {
    id: String,
    format: &'static str,
    status: String,
    status_scheme: Vec<String>,
    changing: bool,
    attributes: AttributeContainer,
}

impl From<&MutableModuleComponentMetadata> for ComponentSummary {
    fn from(metadata: &MutableModuleComponentMetadata) -> Self {
        Self {
            id: metadata.id().to_string(),
            format: metadata.format().name(),
            status: metadata.status().to_string(),
            status_scheme: metadata.status_scheme().to_vec(),
            changing: metadata.is_changing(),
            attributes: metadata.attributes().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReplacementSummary {
    module: String,
    replaced_by: String,
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct RulesReport {
    rules: usize,
    components: Vec<ComponentSummary>,
    replacements: Vec<ReplacementSummary>,
}

impl RulesCommand {
    /// Run the command against the descriptor at `manifest_path`.
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        let workspace = load_workspace(manifest_path).await?;
        let handler = workspace.handler();

        let mut components = Vec::new();
        for mut metadata in workspace.components()? {
            handler.process_metadata(&mut metadata)?;
            components.push(ComponentSummary::from(&metadata));
        }

        let report = RulesReport {
            rules: handler.rule_count(),
            components,
            replacements: handler
                .module_replacements()
                .iter()
                .map(|(module, replacement)| ReplacementSummary {
                    module: module.to_string(),
                    replaced_by: replacement.target.to_string(),
                    reason: replacement.reason.clone(),
                })
                .collect(),
        };

        match self.format {
            OutputFormat::Json => print_json(&report)?,
            OutputFormat::Text => print_text(&report),
        }
        Ok(())
    }
}

fn print_text(report: &RulesReport) {
    println!("{} rule(s) applied", report.rules);
    for component in &report.components {
        let changing = if component.changing {
            " changing".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "{} [{}] {} in [{}]{}",
            component.id.bold(),
            component.format,
            component.status.green(),
            component.status_scheme.join(", "),
            changing
        );
        if !component.attributes.is_empty() {
            println!("  attributes {}", component.attributes);
        }
    }
    for replacement in &report.replacements {
        match &replacement.reason {
            Some(reason) => {
                println!("{} replaced by {} ({})", replacement.module, replacement.replaced_by, reason)
            }
            None => println!("{} replaced by {}", replacement.module, replacement.replaced_by),
        }
    }
}
