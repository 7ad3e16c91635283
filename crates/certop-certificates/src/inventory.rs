//! Inventory reporting views
//!
//! Joins the declarative domain inventory from the config store with the
//! certificate state the resolver observes on disk. Views are recomputed
//! from scratch on every call; nothing is cached.

use std::sync::Arc;

use certop_config::{ConfigStore, DomainConfig};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::models::{CertStatus, CertificateRecord, CustomConfig};
use crate::resolver::CertificateResolver;

/// One manually-deployed subdomain, reported against its parent domain's
/// certificate state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ManualDomainEntry {
    pub domain: String,
    pub parent_domain: String,
    pub deploy_method: String,
    pub cert_exists: bool,
    pub expires: String,
    pub status: CertStatus,
    pub cert_dir: String,
    pub description: String,
}

pub struct InventoryAggregator {
    config: Arc<ConfigStore>,
    resolver: Arc<CertificateResolver>,
}

impl InventoryAggregator {
    pub fn new(config: Arc<ConfigStore>, resolver: Arc<CertificateResolver>) -> Self {
        Self { config, resolver }
    }

    async fn domain_configs(&self) -> Vec<DomainConfig> {
        match self.config.domains().await {
            Ok(domains) => domains,
            Err(e) => {
                warn!(error = %e, "failed to load domain inventory");
                Vec::new()
            }
        }
    }

    /// Resolve every configured domain into a certificate record, attaching
    /// deployment metadata for each subdomain that declares explicit
    /// deployment fields. One domain's failure never stops the build - the
    /// resolver folds failures into the record's status.
    pub async fn build_inventory(&self) -> Vec<CertificateRecord> {
        let mut records = Vec::new();
        for domain_config in self.domain_configs().await {
            let mut record = self.resolver.resolve(&domain_config.domain).await;
            for subdomain in &domain_config.subdomains {
                if !subdomain.domain.is_empty() && subdomain.has_deployment_fields() {
                    record
                        .custom_configs
                        .insert(subdomain.domain.clone(), CustomConfig::from(subdomain));
                }
            }
            records.push(record);
        }
        records
    }

    /// Every subdomain marked for manual deployment, with the parent
    /// domain's resolved certificate state attached.
    pub async fn list_manual_domains(&self) -> Vec<ManualDomainEntry> {
        let mut entries = Vec::new();
        for domain_config in self.domain_configs().await {
            let manual: Vec<_> = domain_config
                .subdomains
                .iter()
                .filter(|sub| !sub.domain.is_empty() && sub.is_manual())
                .collect();
            if manual.is_empty() {
                continue;
            }

            let record = self.resolver.resolve(&domain_config.domain).await;
            for subdomain in manual {
                entries.push(ManualDomainEntry {
                    domain: subdomain.domain.clone(),
                    parent_domain: domain_config.domain.clone(),
                    deploy_method: subdomain.effective_deploy_method().to_string(),
                    cert_exists: record.status.artifact_exists(),
                    expires: record.expiry_date.clone(),
                    status: record.status,
                    cert_dir: record.cert_dir(),
                    description: format!("Manually deployed domain - {}", subdomain.domain),
                });
            }
        }
        entries
    }

    /// Parent domain of a manually-deployed subdomain, used by the manual
    /// certificate download.
    pub async fn find_manual_parent(&self, subdomain: &str) -> Option<String> {
        for domain_config in self.domain_configs().await {
            let is_manual_here = domain_config
                .subdomains
                .iter()
                .any(|sub| sub.domain == subdomain && sub.is_manual());
            if is_manual_here {
                return Some(domain_config.domain.clone());
            }
        }
        None
    }
}
