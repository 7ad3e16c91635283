//! Certop Config - declarative configuration store
//!
//! Reads the domain inventory and DNS-provider credential maps from YAML
//! files, and exposes raw read/write access with validation and
//! backup-then-overwrite semantics for the configuration editor endpoints.

pub mod handler;
pub mod models;
pub mod plugin;
pub mod service;

pub use handler::{configure_routes, ConfigApiDoc, ConfigState};
pub use models::{ConfigKind, DeployMethod, DnsProviderEntry, DomainConfig, SubdomainConfig};
pub use plugin::ConfigPlugin;
pub use service::{ConfigStore, ConfigStoreError};
