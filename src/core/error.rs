//! Error handling for cmeta
//!
//! This module provides the crate error type and user-friendly error reporting. The
//! error system follows two principles:
//! 1. **Strongly-typed errors** so callers can classify failures precisely
//! 2. **User-friendly messages** with actionable suggestions at the CLI boundary
//!
//! # Architecture
//!
//! - [`CmetaError`] - Enumerated failure cases of metadata resolution
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for display
//!
//! Library functions return [`anyhow::Result`]. Typed failures are raised as
//! [`CmetaError`] values, so callers can recover the classification with
//! [`anyhow::Error::downcast_ref`].
//!
//! # Error Categories
//!
//! - **Configuration**: [`CmetaError::UnexpectedStatus`], [`CmetaError::ReplacementCycle`]
//! - **Rules**: [`CmetaError::RuleExecutionFailed`], [`CmetaError::UnsupportedRuleInput`]
//! - **Artifacts**: [`CmetaError::NoMatchingVariant`], [`CmetaError::ArtifactBuildFailed`],
//!   [`CmetaError::TransformFailed`]
//! - **Descriptor**: [`CmetaError::DescriptorNotFound`], [`CmetaError::DescriptorParseError`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use cmeta_cli::core::{CmetaError, user_friendly_error};
//!
//! let error = CmetaError::DescriptorNotFound {
//!     path: "cmeta.toml".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::core::AttributeContainer;

/// The main error type for cmeta operations
///
/// Each variant carries the identity information needed to tell the user which
/// component, rule or artifact failed.
#[derive(Error, Debug)]
pub enum CmetaError {
    /// A component's status is not part of its status scheme after rule application.
    ///
    /// This is a configuration error: it is never retried and aborts the resolution
    /// of the offending component.
    #[error(
        "Unexpected status '{status}' specified for {component}. Expected one of: [{}]",
        .scheme.join(", ")
    )]
    UnexpectedStatus {
        /// Display name of the component being processed
        component: String,
        /// The status left behind by the rules
        status: String,
        /// The status scheme the status was checked against
        scheme: Vec<String>,
    },

    /// A component metadata rule terminated abnormally.
    ///
    /// All failures inside rule bodies, including panics, surface as this single
    /// variant. The original cause is kept as the error source.
    #[error("Could not apply component metadata rule {rule} to {component}")]
    RuleExecutionFailed {
        /// Description of the rule that failed
        rule: String,
        /// Display name of the component being processed
        component: String,
        /// The failure raised by the rule body
        #[source]
        source: anyhow::Error,
    },

    /// A rule declared an extra input type that metadata rules cannot receive.
    #[error(
        "Rule {rule} declares unsupported input type '{input}'. Supported input types: [{}]",
        .supported.join(", ")
    )]
    UnsupportedRuleInput {
        /// Description of the rejected rule
        rule: String,
        /// The declared input type that is not supported
        input: String,
        /// Input types rules may declare
        supported: Vec<String>,
    },

    /// A module or component notation could not be parsed.
    #[error("Invalid module notation '{notation}': {reason}")]
    InvalidModuleNotation {
        /// The notation as written
        notation: String,
        /// Why the notation was rejected
        reason: String,
    },

    /// A module replacement would make modules replace each other in a loop.
    #[error(
        "Cannot declare module replacement {module} -> {target} because it introduces a cycle: {cycle}"
    )]
    ReplacementCycle {
        /// The module being replaced
        module: String,
        /// The requested replacement
        target: String,
        /// The cycle, formatted as `a -> b -> a`
        cycle: String,
    },

    /// A configuration with the same name already exists.
    #[error("Configuration '{name}' already exists")]
    DuplicateConfiguration {
        /// Configuration name
        name: String,
    },

    /// A configuration was referenced by name but never declared.
    #[error("Configuration '{name}' not found")]
    ConfigurationNotFound {
        /// Configuration name
        name: String,
    },

    /// No artifact form of a component satisfies the requested attributes.
    #[error(
        "No variant of {artifact} from {component} matches the requested attributes {requested}"
    )]
    NoMatchingVariant {
        /// Display name of the owning component
        component: String,
        /// Display name of the artifact
        artifact: String,
        /// The requested attributes
        requested: AttributeContainer,
    },

    /// The work producing an artifact failed.
    #[error("Failed to build artifact {artifact}: {reason}")]
    ArtifactBuildFailed {
        /// Display name of the artifact
        artifact: String,
        /// The producer's failure
        reason: String,
    },

    /// A transform of an artifact into the requested form failed.
    #[error("Failed to transform {artifact} to {requested}: {reason}")]
    TransformFailed {
        /// Display name of the artifact
        artifact: String,
        /// The requested target attributes
        requested: AttributeContainer,
        /// The transform's failure
        reason: String,
    },

    /// The project descriptor file does not exist.
    #[error("Project descriptor not found: {path}")]
    DescriptorNotFound {
        /// Path that was searched
        path: String,
    },

    /// The project descriptor exists but is invalid.
    #[error("Invalid project descriptor {file}: {reason}")]
    DescriptorParseError {
        /// Descriptor path
        file: String,
        /// Parse or validation failure
        reason: String,
    },

    /// Generic error for cases not covered by specific variants
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error context wrapper that provides user-friendly error information
///
/// Displays:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context in yellow (optional)
/// 3. **Suggestion**: Actionable steps in green (optional)
///
/// # Examples
///
/// ```rust,no_run
/// use cmeta_cli::core::{CmetaError, ErrorContext};
///
/// let context = ErrorContext::new(CmetaError::ConfigurationNotFound {
///     name: "runtimeClasspath".to_string(),
/// })
/// .with_suggestion("Declare the configuration in cmeta.toml");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: CmetaError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: CmetaError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognises:
/// - [`CmetaError`] variants with tailored suggestions
/// - [`std::io::Error`] with filesystem guidance
/// - [`toml::de::Error`] with descriptor syntax help
/// - Anything else, printed with its full cause chain
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<CmetaError>() {
        Ok(cmeta_error) => return create_error_context(cmeta_error),
        Err(error) => error,
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(CmetaError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check file ownership and permissions of the project directory");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(CmetaError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(CmetaError::DescriptorParseError {
            file: "cmeta.toml".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in cmeta.toml. Verify quotes, brackets and table names");
    }

    ErrorContext::new(CmetaError::Other {
        message: format_chain(&error),
    })
}

/// Render an error and its causes, one cause per line.
fn format_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();

    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    message
}

/// Map each [`CmetaError`] variant to an [`ErrorContext`] with tailored suggestions.
fn create_error_context(error: CmetaError) -> ErrorContext {
    let (details, suggestion): (Option<String>, Option<&str>) = match &error {
        CmetaError::UnexpectedStatus {
            ..
        } => (
            Some("A component's status must be one of the values of its status scheme".to_string()),
            Some("Add the status to the component's status scheme, or fix the rule that sets it"),
        ),

        CmetaError::RuleExecutionFailed {
            source,
            ..
        } => (
            Some(format!("{source:#}")),
            Some("Fix the failing rule; run with --verbose to see which rules were applied"),
        ),

        CmetaError::UnsupportedRuleInput {
            ..
        } => (None, Some("Remove the unsupported entry from the rule's `requires` list")),

        CmetaError::ReplacementCycle {
            ..
        } => (None, Some("Remove one of the conflicting [[replacements]] entries")),

        CmetaError::ConfigurationNotFound {
            name,
        } => (
            Some(format!("No [[configurations]] entry is named \"{name}\"")),
            Some("Declare the configuration in cmeta.toml or check its spelling"),
        ),

        CmetaError::NoMatchingVariant {
            ..
        } => (
            Some("Use --lenient to skip artifacts that cannot be provided".to_string()),
            Some("Declare a [[transforms]] entry producing the requested attributes"),
        ),

        CmetaError::DescriptorNotFound {
            ..
        } => (None, Some("Create a cmeta.toml in the project directory or pass --manifest-path")),

        CmetaError::DescriptorParseError {
            ..
        } => (None, Some("Check the TOML syntax and key names in cmeta.toml")),

        _ => (None, None),
    };

    let mut context = ErrorContext::new(error);
    if let Some(details) = details {
        context = context.with_details(details);
    }
    if let Some(suggestion) = suggestion {
        context = context.with_suggestion(suggestion);
    }
    context
}
