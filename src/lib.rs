//! cmeta - component metadata resolution core
//!
//! The metadata side of a dependency resolver for a build tool. It answers three
//! questions about a build:
//!
//! - What does the resolving project look like as the root of a dependency graph?
//!   [`root`] builds that snapshot from the project's configurations and caches it
//!   until a relevant configuration mutation invalidates it.
//! - What is the normalised metadata of an external component? [`rules`] applies
//!   user-declared component metadata rules, in order, and validates the resulting
//!   status against the status scheme.
//! - Which files does a consumer get? [`artifacts`] offers lazy, filtered views over a
//!   resolved configuration, building project artifacts and running artifact transforms
//!   only for the components a view admits.
//!
//! # Core Modules
//!
//! ## Resolution
//! - [`root`] - Root component metadata builder and its two-state cache
//! - [`rules`] - Component metadata rules, rule inputs and module replacements
//! - [`artifacts`] - Resolved artifacts, artifact views and transform memoisation
//!
//! ## Model
//! - [`identity`] - Module coordinates and component identifiers
//! - [`project`] - Configurations, project state and dependency locking
//! - [`mutation`] - Mutation kinds and the validators notified of them
//! - [`core`] - Attributes and error handling
//!
//! ## Front End
//! - [`config`] - The `cmeta.toml` project descriptor
//! - [`cli`] - The `cmeta` command line
//!
//! # Descriptor Format (cmeta.toml)
//!
//! ```toml
//! [project]
//! group = "org.example"
//! name = "app"
//! version = "1.0"
//! path = ":app"
//!
//! [[configurations]]
//! name = "runtime"
//! attributes = { usage = "runtime" }
//! dependencies = ["org.example:lib:2.0", ":core"]
//! files = ["libs/local.jar"]
//!
//! [[components]]
//! id = "org.ivy:mod:1.0"
//! format = "ivy"
//! branch = "release"
//!
//! [[rules]]
//! module = "org.ivy:*"
//! requires = ["ivy-descriptor"]
//! status-from-branch = true
//!
//! [[projects]]
//! path = ":core"
//! artifacts = [{ name = "core.jar", attributes = { type = "jar" } }]
//!
//! [[transforms]]
//! from = { type = "jar" }
//! to = { type = "classes" }
//! suffix = "-classes"
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! cmeta root
//! cmeta rules --format json
//! cmeta view runtime --include ':core' --attribute type=classes
//! ```

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod core;
pub mod identity;
pub mod mutation;
pub mod project;
pub mod root;
pub mod rules;

// test_utils is available for tests and when the test-utils feature is enabled
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
