//! Core types shared by every cmeta module
//!
//! - [`error`] - [`CmetaError`], [`ErrorContext`] and [`user_friendly_error`]
//! - [`attributes`] - [`AttributeContainer`], the attribute sets that describe artifact
//!   forms and consumer requests
//!
//! # Error Handling Pattern
//!
//! ```rust
//! use cmeta_cli::core::{CmetaError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn example_operation() -> Result<String> {
//!     Err(CmetaError::ConfigurationNotFound {
//!         name: "runtimeClasspath".to_string(),
//!     }
//!     .into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.suggestion.is_some());
//! }
//! ```

pub mod attributes;
pub mod error;

pub use attributes::AttributeContainer;
pub use error::{CmetaError, ErrorContext, user_friendly_error};
