//! Command-line interface for cmeta.
//!
//! cmeta inspects the dependency metadata of a project described by `cmeta.toml`:
//! the root component the project presents to dependency resolution, external
//! component metadata after the declared rules run, and filtered artifact views over a
//! resolved configuration.
//!
//! # Commands
//!
//! - `root` - Build the root component metadata
//! - `rules` - Apply component metadata rules to the declared components
//! - `view` - Print the files of an artifact view over a configuration
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug logging
//! - `--quiet` - Only log errors
//! - `--manifest-path <PATH>` - Use a descriptor other than `./cmeta.toml`
//! - `--no-color` - Disable colored output
//!
//! Without `--verbose` or `--quiet`, the log filter comes from `RUST_LOG` and defaults
//! to warnings. Logs go to stderr so command output stays machine-readable.
//!
//! # Example
//!
//! ```bash
//! cmeta root --configuration runtime --format json
//! cmeta rules
//! cmeta view runtime --include ':core' --attribute type=classes
//! ```

pub mod common;
mod root;
mod rules;
mod view;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` defers to `RUST_LOG`
    pub log_level: Option<String>,

    /// Disable colored output
    pub no_color: bool,
}

impl CliConfig {
    /// Default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the stderr log subscriber and the color override. Later calls are no-ops.
    pub fn init(&self) {
        if self.no_color {
            colored::control::set_override(false);
        }

        LOGGING.call_once(|| {
            let filter = match &self.log_level {
                Some(level) => EnvFilter::new(level),
                None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            };
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init();
        });
    }
}

/// Inspect dependency metadata of a cmeta project.
#[derive(Parser, Debug)]
#[command(
    name = "cmeta",
    about = "Inspect root component metadata, metadata rules and artifact views",
    version,
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to cmeta.toml (defaults to ./cmeta.toml)
    #[arg(long, global = true)]
    manifest_path: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the project's root component metadata
    Root(root::RootCommand),

    /// Apply component metadata rules to the declared components
    Rules(rules::RulesCommand),

    /// Print the files of an artifact view over a configuration
    View(view::ViewCommand),
}

impl Cli {
    /// Execute with settings derived from the parsed flags.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Settings implied by `--verbose`, `--quiet` and `--no-color`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            no_color: self.no_color,
        }
    }

    /// Execute with explicit settings.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init();

        match self.command {
            Commands::Root(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
            Commands::Rules(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
            Commands::View(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
        }
    }
}
