//! Filesystem layout for the control plane
//!
//! The original deployment ran with hard-coded `/config`, `/data` and
//! `/scripts` mounts. All components instead receive a [`StorePaths`] at
//! construction so tests can point them at temporary directories.

use std::path::{Path, PathBuf};

// Well-known names under data_dir / scripts_dir
pub const CERTS_DIR_NAME: &str = "certs";
pub const LOGS_DIR_NAME: &str = "logs";
pub const PROVISIONER_SCRIPT_NAME: &str = "cert-manager.sh";
pub const HEALTH_SCRIPT_NAME: &str = "cert-manager-simple.sh";
pub const LAST_CHECK_FILE_NAME: &str = "last_check.txt";

/// Resolved directory layout shared by every component.
#[derive(Debug, Clone)]
pub struct StorePaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
    scripts_dir: PathBuf,
}

impl StorePaths {
    pub fn new(
        config_dir: impl Into<PathBuf>,
        data_dir: impl Into<PathBuf>,
        scripts_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config_dir: config_dir.into(),
            data_dir: data_dir.into(),
            scripts_dir: scripts_dir.into(),
        }
    }

    /// Directory holding the YAML configuration files.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Base data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Certificate store: one subdirectory per domain (plain, `_ecc`
    /// suffixed, and wildcard-alias directories prefixed `*.`).
    pub fn cert_dir(&self) -> PathBuf {
        self.data_dir.join(CERTS_DIR_NAME)
    }

    /// Directory for log files produced by the provisioning tool and cron.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOGS_DIR_NAME)
    }

    /// The provisioning tool invoked for generate/renew.
    pub fn provisioner_script(&self) -> PathBuf {
        self.scripts_dir.join(PROVISIONER_SCRIPT_NAME)
    }

    /// The script answering `health-check` invocations.
    pub fn health_script(&self) -> PathBuf {
        self.scripts_dir.join(HEALTH_SCRIPT_NAME)
    }

    /// Timestamp file written by the scheduled check job.
    pub fn last_check_file(&self) -> PathBuf {
        self.log_dir().join(LAST_CHECK_FILE_NAME)
    }

    /// A configuration file under the config directory.
    pub fn config_file(&self, file_name: &str) -> PathBuf {
        self.config_dir.join(file_name)
    }

    /// Ensure the runtime directories (certs, logs) exist.
    pub async fn ensure_directories(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.cert_dir()).await?;
        tokio::fs::create_dir_all(self.log_dir()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_well_known_paths() {
        let paths = StorePaths::new("/config", "/data", "/scripts");

        assert_eq!(paths.cert_dir(), PathBuf::from("/data/certs"));
        assert_eq!(paths.log_dir(), PathBuf::from("/data/logs"));
        assert_eq!(
            paths.provisioner_script(),
            PathBuf::from("/scripts/cert-manager.sh")
        );
        assert_eq!(
            paths.config_file("domains.yml"),
            PathBuf::from("/config/domains.yml")
        );
    }

    #[tokio::test]
    async fn ensure_directories_creates_runtime_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = StorePaths::new(
            tmp.path().join("config"),
            tmp.path().join("data"),
            tmp.path().join("scripts"),
        );

        paths.ensure_directories().await.unwrap();

        assert!(paths.cert_dir().is_dir());
        assert!(paths.log_dir().is_dir());
    }
}
