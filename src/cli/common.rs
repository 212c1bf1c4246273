//! Helpers shared by the CLI commands.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::{DESCRIPTOR_FILE, ProjectWorkspace};

/// How a command prints its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// The descriptor path: `--manifest-path` if given, else `cmeta.toml` in the current
/// directory.
pub fn descriptor_path(manifest_path: Option<PathBuf>) -> Result<PathBuf> {
    match manifest_path {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()
            .context("Failed to determine the current directory")?
            .join(DESCRIPTOR_FILE)),
    }
}

/// Load the workspace the command runs against.
pub async fn load_workspace(manifest_path: Option<PathBuf>) -> Result<ProjectWorkspace> {
    let path = descriptor_path(manifest_path)?;
    ProjectWorkspace::load(&path).await
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

/// Parse `key=value` for `--attribute`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}
