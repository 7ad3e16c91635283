//! Certop Certificates - certificate resolution and orchestration engine
//!
//! The heart of the control plane:
//! - [`CertificateResolver`] locates the authoritative certificate artifact
//!   for a domain among the storage layouts the provisioning tool produces,
//!   and classifies its expiry/health state
//! - [`OrchestrationEngine`] drives the external provisioning tool for
//!   generate/renew/delete and the system health probe
//! - [`InventoryAggregator`] combines resolver output with subdomain
//!   deployment metadata into the reporting views
//! - [`ArtifactPackager`] bundles a resolved certificate directory into a
//!   zip archive for download

pub mod errors;
pub mod handlers;
pub mod inventory;
pub mod models;
pub mod orchestrator;
pub mod packager;
pub mod plugin;
pub mod resolver;

pub use errors::PackageError;
pub use inventory::{InventoryAggregator, ManualDomainEntry};
pub use models::{
    CertAlgorithm, CertKind, CertStatus, CertificateRecord, CustomConfig, ExpiryDays,
};
pub use orchestrator::{OperationOutcome, OrchestrationEngine, SystemStatus};
pub use packager::ArtifactPackager;
pub use plugin::CertificatesPlugin;
pub use resolver::CertificateResolver;
