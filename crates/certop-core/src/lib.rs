//! Certop Core - shared foundations for the certificate control plane
//!
//! This crate provides:
//! - RFC 7807 problem-details responses and an error builder
//! - The plugin system used to assemble the HTTP application
//! - Bounded external command execution (`CommandRunner`)
//! - Filesystem layout configuration (`StorePaths`)

pub mod command;
pub mod error_builder;
pub mod paths;
pub mod plugin;
pub mod problemdetails;

pub use command::{CommandOutcome, CommandRunner, DEFAULT_COMMAND_TIMEOUT};
pub use error_builder::ErrorBuilder;
pub use paths::StorePaths;
pub use plugin::{CertopPlugin, PluginContext, PluginError, PluginManager, PluginRoutes};
pub use problemdetails::Problem;
