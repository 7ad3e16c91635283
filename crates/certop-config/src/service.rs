use std::collections::HashMap;
use std::path::PathBuf;

use certop_core::StorePaths;
use thiserror::Error;
use tracing::{error, info};

use crate::models::{ConfigKind, DnsProvidersFile, DomainConfig, DomainsFile};

#[derive(Error, Debug)]
pub enum ConfigStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    InvalidYaml(String),

    #[error("Configuration file not found: {0}")]
    NotFound(String),
}

/// Read/write access to the YAML configuration files.
///
/// Reads are always fresh - there is no in-memory cache, so changes made
/// by the provisioning tool or an operator are visible on the next request.
pub struct ConfigStore {
    paths: StorePaths,
}

impl ConfigStore {
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }

    fn config_path(&self, kind: ConfigKind) -> PathBuf {
        self.paths.config_file(kind.file_name())
    }

    /// The declared domain inventory. A missing file yields an empty list.
    pub async fn domains(&self) -> Result<Vec<DomainConfig>, ConfigStoreError> {
        let path = self.config_path(ConfigKind::Domains);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let file: DomainsFile = serde_yaml::from_str(&content).map_err(|e| {
            error!("Failed to parse domains config: {}", e);
            ConfigStoreError::InvalidYaml(e.to_string())
        })?;
        Ok(file.domains)
    }

    /// Environment variables declared for a DNS provider. Unknown providers
    /// and a missing credentials file both yield an empty map.
    pub async fn dns_env_vars(
        &self,
        provider: &str,
    ) -> Result<HashMap<String, String>, ConfigStoreError> {
        let path = self.config_path(ConfigKind::Dns);
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let file: DnsProvidersFile = serde_yaml::from_str(&content)
            .map_err(|e| ConfigStoreError::InvalidYaml(e.to_string()))?;

        Ok(file
            .dns_providers
            .get(provider)
            .map(|entry| entry.env_vars.clone())
            .unwrap_or_default())
    }

    /// Raw text content of a configuration file.
    pub async fn read_raw(&self, kind: ConfigKind) -> Result<String, ConfigStoreError> {
        let path = self.config_path(kind);
        if !path.exists() {
            return Err(ConfigStoreError::NotFound(
                kind.file_name().to_string(),
            ));
        }
        Ok(tokio::fs::read_to_string(&path).await?)
    }

    /// Replace a configuration file with new content.
    ///
    /// The content must parse as well-formed YAML; invalid content is
    /// rejected before any file mutation. An existing file is copied to a
    /// timestamped backup first, then overwritten. Best-effort only: there
    /// is no atomic rename and no lock against concurrent writers.
    pub async fn write_raw(
        &self,
        kind: ConfigKind,
        content: &str,
    ) -> Result<(), ConfigStoreError> {
        serde_yaml::from_str::<serde_yaml::Value>(content)
            .map_err(|e| ConfigStoreError::InvalidYaml(e.to_string()))?;

        let path = self.config_path(kind);
        if path.exists() {
            let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
            let backup = PathBuf::from(format!("{}.backup.{}", path.display(), stamp));
            tokio::fs::copy(&path, &backup).await?;
            info!("Backed up {} to {}", path.display(), backup.display());
        } else if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, content).await?;
        info!("Wrote configuration file {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(tmp: &tempfile::TempDir) -> ConfigStore {
        let paths = StorePaths::new(
            tmp.path().join("config"),
            tmp.path().join("data"),
            tmp.path().join("scripts"),
        );
        std::fs::create_dir_all(paths.config_dir()).unwrap();
        ConfigStore::new(paths)
    }

    #[tokio::test]
    async fn missing_domains_file_yields_empty_inventory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(&tmp);

        assert!(store.domains().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reads_dns_provider_env_vars() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(&tmp);

        store
            .write_raw(
                ConfigKind::Dns,
                r#"
dns_providers:
  aliyun:
    env_vars:
      Ali_Key: key-123
      Ali_Secret: secret-456
"#,
            )
            .await
            .unwrap();

        let vars = store.dns_env_vars("aliyun").await.unwrap();
        assert_eq!(vars.get("Ali_Key").map(String::as_str), Some("key-123"));
        assert_eq!(vars.len(), 2);

        assert!(store.dns_env_vars("unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_invalid_yaml_before_mutation() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(&tmp);

        store
            .write_raw(ConfigKind::Domains, "domains: []\n")
            .await
            .unwrap();

        let result = store
            .write_raw(ConfigKind::Domains, "domains: [unclosed")
            .await;
        assert!(matches!(result, Err(ConfigStoreError::InvalidYaml(_))));

        // Previous content untouched
        let content = store.read_raw(ConfigKind::Domains).await.unwrap();
        assert_eq!(content, "domains: []\n");
    }

    #[tokio::test]
    async fn write_creates_timestamped_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(&tmp);

        store
            .write_raw(ConfigKind::Servers, "servers: []\n")
            .await
            .unwrap();
        store
            .write_raw(ConfigKind::Servers, "servers:\n  - host: web-1\n")
            .await
            .unwrap();

        let config_dir = tmp.path().join("config");
        let backups: Vec<_> = std::fs::read_dir(&config_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with("servers.yml.backup.")
            })
            .collect();
        assert_eq!(backups.len(), 1);

        let backup_content = std::fs::read_to_string(backups[0].path()).unwrap();
        assert_eq!(backup_content, "servers: []\n");
        assert_eq!(
            store.read_raw(ConfigKind::Servers).await.unwrap(),
            "servers:\n  - host: web-1\n"
        );
    }
}
