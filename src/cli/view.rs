//! `cmeta view`: list the artifacts of a configuration through a filtered view.

use anyhow::{Context, Result};
use clap::Args;
use glob::Pattern;
use std::path::PathBuf;

use crate::artifacts::{ResolvedArtifactResult, ViewConfiguration};
use crate::cli::common::{OutputFormat, load_workspace, parse_key_value, print_json};
use crate::identity::ComponentIdentifier;

/// Resolve a configuration and print the files of an artifact view over it.
#[derive(Args, Debug)]
pub struct ViewCommand {
    /// Configuration to resolve
    configuration: String,

    /// Only include components matching this glob (repeatable). Modules match as
    /// `group:name:version`, projects by path, files by file name.
    #[arg(short = 'i', long = "include")]
    include: Vec<String>,

    /// Request `key=value` on top of the configuration's attributes (repeatable)
    #[arg(short = 'a', long = "attribute", value_parser = parse_key_value)]
    attributes: Vec<(String, String)>,

    /// Skip artifacts that cannot be built, transformed or matched
    #[arg(long)]
    lenient: bool,

    /// Print artifact identifiers next to the files
    #[arg(long)]
    artifacts: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// The string `--include` globs are matched against.
fn filter_key(id: &ComponentIdentifier) -> String {
    match id {
        ComponentIdentifier::Project {
            path,
        } => path.clone(),
        other => other.to_string(),
    }
}

impl ViewCommand {
    fn view_configuration(&self) -> Result<ViewConfiguration> {
        let mut configuration = ViewConfiguration::new().lenient(self.lenient);
        for (key, value) in &self.attributes {
            configuration = configuration.attribute(key, value);
        }

        if !self.include.is_empty() {
            let patterns = self
                .include
                .iter()
                .map(|p| Pattern::new(p).with_context(|| format!("Invalid --include pattern '{p}'")))
                .collect::<Result<Vec<_>>>()?;
            configuration = configuration.component_filter(move |id| {
                let key = filter_key(id);
                patterns.iter().any(|p| p.matches(&key))
            });
        }
        Ok(configuration)
    }

    /// Run the command against the descriptor at `manifest_path`.
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        let workspace = load_workspace(manifest_path).await?;
        let result = workspace.resolve(&self.configuration)?;
        let view = result.view(self.view_configuration()?);

        let artifacts = view.artifacts().collect::<Result<Vec<ResolvedArtifactResult>>>()?;
        match self.format {
            OutputFormat::Json => print_json(&artifacts)?,
            OutputFormat::Text if self.artifacts => {
                for artifact in &artifacts {
                    println!("{}\t{}", artifact.id, artifact.file.display());
                }
            }
            OutputFormat::Text => {
                for artifact in &artifacts {
                    println!("{}", artifact.file.display());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ModuleVersionIdentifier;

    #[test]
    fn test_filter_key() {
        assert_eq!(filter_key(&ComponentIdentifier::project(":core")), ":core");
        assert_eq!(
            filter_key(&ComponentIdentifier::Module(ModuleVersionIdentifier::new("g", "n", "1"))),
            "g:n:1"
        );
        assert_eq!(filter_key(&ComponentIdentifier::opaque("local.jar")), "local.jar");
    }
}
