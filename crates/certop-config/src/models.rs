use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One top-level domain entry from `domains.yml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainConfig {
    pub domain: String,
    #[serde(default)]
    pub subdomains: Vec<SubdomainConfig>,
}

/// A subdomain with its deployment metadata.
///
/// Deployment fields are optional in the YAML; `None` means the field was
/// not declared at all, which matters for the inventory view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubdomainConfig {
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_method: Option<DeployMethod>,
}

impl SubdomainConfig {
    /// Whether this entry declares any explicit deployment fields.
    pub fn has_deployment_fields(&self) -> bool {
        self.deploy_dir.is_some()
            || self.cert_filename.is_some()
            || self.key_filename.is_some()
            || self.deploy_method.is_some()
    }

    /// Deployment method with the `auto` default applied.
    pub fn effective_deploy_method(&self) -> DeployMethod {
        self.deploy_method.unwrap_or_default()
    }

    pub fn is_manual(&self) -> bool {
        self.effective_deploy_method() == DeployMethod::Manual
    }
}

/// How a subdomain's certificate files reach their target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeployMethod {
    #[default]
    Auto,
    Manual,
}

impl fmt::Display for DeployMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployMethod::Auto => write!(f, "auto"),
            DeployMethod::Manual => write!(f, "manual"),
        }
    }
}

/// One DNS provider entry from `dns-providers.yml`: the environment
/// variables handed to the provisioning tool during generation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DnsProviderEntry {
    #[serde(default)]
    pub env_vars: HashMap<String, String>,
}

/// Top-level shape of `domains.yml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct DomainsFile {
    #[serde(default)]
    pub domains: Vec<DomainConfig>,
}

/// Top-level shape of `dns-providers.yml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct DnsProvidersFile {
    #[serde(default)]
    pub dns_providers: HashMap<String, DnsProviderEntry>,
}

/// The editable configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum ConfigKind {
    Domains,
    Dns,
    Servers,
    Notification,
}

impl ConfigKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ConfigKind::Domains => "domains.yml",
            ConfigKind::Dns => "dns-providers.yml",
            ConfigKind::Servers => "servers.yml",
            ConfigKind::Notification => "notify.yml",
        }
    }
}

impl FromStr for ConfigKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domains" => Ok(ConfigKind::Domains),
            "dns" => Ok(ConfigKind::Dns),
            "servers" => Ok(ConfigKind::Servers),
            "notification" => Ok(ConfigKind::Notification),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_domains_yaml_with_defaults() {
        let yaml = r#"
domains:
  - domain: example.com
    subdomains:
      - domain: www.example.com
        deploy_dir: /etc/nginx/certs
        deploy_method: manual
      - domain: api.example.com
"#;
        let file: DomainsFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.domains.len(), 1);

        let config = &file.domains[0];
        assert_eq!(config.domain, "example.com");
        assert_eq!(
            config.subdomains[0].deploy_method,
            Some(DeployMethod::Manual)
        );
        assert!(config.subdomains[0].is_manual());
        assert!(config.subdomains[0].has_deployment_fields());

        assert_eq!(config.subdomains[1].deploy_method, None);
        assert_eq!(
            config.subdomains[1].effective_deploy_method(),
            DeployMethod::Auto
        );
        assert!(!config.subdomains[1].has_deployment_fields());
    }

    #[test]
    fn config_kind_round_trip() {
        for (name, kind) in [
            ("domains", ConfigKind::Domains),
            ("dns", ConfigKind::Dns),
            ("servers", ConfigKind::Servers),
            ("notification", ConfigKind::Notification),
        ] {
            assert_eq!(name.parse::<ConfigKind>().unwrap(), kind);
        }
        assert!("nonsense".parse::<ConfigKind>().is_err());
    }
}
