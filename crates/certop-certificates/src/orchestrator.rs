//! Certificate lifecycle orchestration
//!
//! Drives the external provisioning tool for generate/renew, removes
//! certificate store directories on delete, and packages directories for
//! download. Mutating operations on the same domain are serialized through a
//! keyed async lock table; operations on different domains proceed
//! concurrently.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use certop_config::ConfigStore;
use certop_core::{CommandRunner, StorePaths, DEFAULT_COMMAND_TIMEOUT};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::models::CertKind;
use crate::packager::ArtifactPackager;
use crate::resolver::CertificateResolver;

/// DNS validation for wildcard certificates is slow; generate and renew get
/// a longer bound than ordinary commands.
const PROVISION_TIMEOUT: Duration = Duration::from_secs(600);

/// Result of a mutating certificate operation, in the shape the HTTP layer
/// returns verbatim.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OperationOutcome {
    pub success: bool,
    pub message: String,
}

impl OperationOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Outcome of the system health probe.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SystemStatus {
    pub healthy: bool,
    pub message: String,
    pub timestamp: String,
}

pub struct OrchestrationEngine {
    paths: StorePaths,
    runner: Arc<CommandRunner>,
    config: Arc<ConfigStore>,
    resolver: Arc<CertificateResolver>,
    packager: ArtifactPackager,
    domain_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl OrchestrationEngine {
    pub fn new(
        paths: StorePaths,
        runner: Arc<CommandRunner>,
        config: Arc<ConfigStore>,
        resolver: Arc<CertificateResolver>,
    ) -> Self {
        Self {
            paths,
            runner,
            config,
            resolver,
            packager: ArtifactPackager::new(),
            domain_locks: Mutex::new(HashMap::new()),
        }
    }

    /// At most one generate/renew/delete runs per domain at a time. The
    /// returned lock is shared by every caller naming the same domain.
    async fn domain_lock(&self, domain: &str) -> Arc<Mutex<()>> {
        let mut table = self.domain_locks.lock().await;
        table.entry(domain.to_string()).or_default().clone()
    }

    /// Generate a certificate through the provisioning tool.
    ///
    /// Wildcard requests rewrite the domain argument to `*.{domain}`. DNS
    /// provider credentials are injected into the child environment, never
    /// interpolated into a shell string.
    pub async fn generate(
        &self,
        domain: &str,
        kind: CertKind,
        dns_provider: &str,
    ) -> OperationOutcome {
        let lock = self.domain_lock(domain).await;
        let _guard = lock.lock().await;

        let domain_arg = match kind {
            CertKind::Wildcard => format!("*.{}", domain),
            CertKind::Single => domain.to_string(),
        };

        let envs = match self.config.dns_env_vars(dns_provider).await {
            Ok(envs) => envs,
            Err(e) => {
                warn!(dns_provider, error = %e, "failed to load DNS provider credentials");
                HashMap::new()
            }
        };

        let outcome = self
            .runner
            .run_with_env(
                self.paths.provisioner_script(),
                &["generate", &domain_arg],
                PROVISION_TIMEOUT,
                &envs,
            )
            .await;

        if outcome.success {
            info!(domain, "certificate generated");
            OperationOutcome::ok("Certificate generated successfully")
        } else {
            error!(domain, stderr = %outcome.stderr, "certificate generation failed");
            OperationOutcome::failed(outcome.stderr)
        }
    }

    /// Renew an existing certificate through the provisioning tool.
    pub async fn renew(&self, domain: &str) -> OperationOutcome {
        let lock = self.domain_lock(domain).await;
        let _guard = lock.lock().await;

        let outcome = self
            .runner
            .run(
                self.paths.provisioner_script(),
                &["renew", domain],
                PROVISION_TIMEOUT,
            )
            .await;

        if outcome.success {
            info!(domain, "certificate renewed");
            OperationOutcome::ok("Certificate renewed successfully")
        } else {
            error!(domain, stderr = %outcome.stderr, "certificate renewal failed");
            OperationOutcome::failed(outcome.stderr)
        }
    }

    /// Remove every store directory belonging to `domain` (plain, `_ecc`
    /// and wildcard-alias variants). Succeeds iff at least one directory
    /// was removed.
    pub async fn delete(&self, domain: &str) -> OperationOutcome {
        let lock = self.domain_lock(domain).await;
        let _guard = lock.lock().await;

        let mut deleted = false;
        for dir in self.resolver.matching_directories(domain) {
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => {
                    info!(domain, dir = %dir.display(), "removed certificate directory");
                    deleted = true;
                }
                Err(e) => {
                    error!(domain, dir = %dir.display(), error = %e, "failed to remove certificate directory");
                    return OperationOutcome::failed(e.to_string());
                }
            }
        }

        if deleted {
            OperationOutcome::ok("Certificate deleted successfully")
        } else {
            OperationOutcome::failed("Certificate files do not exist")
        }
    }

    /// Package the domain's certificate directory into a zip archive.
    /// `None` when no directory resolves or packaging fails.
    pub async fn download(&self, domain: &str) -> Option<PathBuf> {
        let dir = self.resolver.locate_directory(domain)?;
        match self.packager.package(&dir) {
            Ok(archive) => Some(archive),
            Err(e) => {
                error!(domain, error = %e, "failed to package certificate directory");
                None
            }
        }
    }

    /// Run the external health probe script.
    pub async fn health_check(&self) -> SystemStatus {
        let outcome = self
            .runner
            .run(
                self.paths.health_script(),
                &["health-check"],
                DEFAULT_COMMAND_TIMEOUT,
            )
            .await;

        SystemStatus {
            healthy: outcome.success,
            message: if outcome.success {
                outcome.stdout
            } else {
                outcome.stderr
            },
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    struct Fixture {
        _tmp: tempfile::TempDir,
        paths: StorePaths,
        engine: OrchestrationEngine,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let paths = StorePaths::new(
            tmp.path().join("config"),
            tmp.path().join("data"),
            tmp.path().join("scripts"),
        );
        fs::create_dir_all(paths.config_dir()).unwrap();
        fs::create_dir_all(paths.cert_dir()).unwrap();
        fs::create_dir_all(paths.provisioner_script().parent().unwrap()).unwrap();

        let runner = Arc::new(CommandRunner::new());
        let config = Arc::new(ConfigStore::new(paths.clone()));
        let resolver = Arc::new(CertificateResolver::new(paths.cert_dir(), runner.clone()));
        let engine = OrchestrationEngine::new(paths.clone(), runner, config, resolver);
        Fixture {
            _tmp: tmp,
            paths,
            engine,
        }
    }

    /// Install a provisioner stand-in that records its argv to `args.txt`
    /// next to the script.
    fn install_recording_script(paths: &StorePaths) {
        let script = paths.provisioner_script();
        let record = script.parent().unwrap().join("args.txt");
        fs::write(
            &script,
            format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\nprintf '%s' \"$Ali_Key\" >> '{}'\n", record.display(), record.display()),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn generate_rewrites_wildcard_domain_and_injects_credentials() {
        let fx = fixture();
        install_recording_script(&fx.paths);
        fs::write(
            fx.paths.config_file("dns-providers.yml"),
            "dns_providers:\n  aliyun:\n    env_vars:\n      Ali_Key: key-123\n",
        )
        .unwrap();

        let outcome = fx
            .engine
            .generate("example.com", CertKind::Wildcard, "aliyun")
            .await;
        assert!(outcome.success);

        let recorded =
            fs::read_to_string(fx.paths.provisioner_script().parent().unwrap().join("args.txt"))
                .unwrap();
        assert_eq!(recorded, "generate\n*.example.com\nkey-123");
    }

    #[tokio::test]
    async fn generate_single_passes_domain_unchanged() {
        let fx = fixture();
        install_recording_script(&fx.paths);

        let outcome = fx
            .engine
            .generate("example.com", CertKind::Single, "unknown-provider")
            .await;
        assert!(outcome.success);

        let recorded =
            fs::read_to_string(fx.paths.provisioner_script().parent().unwrap().join("args.txt"))
                .unwrap();
        assert!(recorded.starts_with("generate\nexample.com\n"));
    }

    #[tokio::test]
    async fn generate_reports_stderr_on_script_failure() {
        let fx = fixture();
        let script = fx.paths.provisioner_script();
        fs::write(&script, "#!/bin/sh\necho 'dns validation failed' >&2\nexit 1\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let outcome = fx
            .engine
            .generate("example.com", CertKind::Single, "aliyun")
            .await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("dns validation failed"));
    }

    #[tokio::test]
    async fn delete_removes_every_matching_directory() {
        let fx = fixture();
        let certs = fx.paths.cert_dir();
        for dir in ["example.com", "example.com_ecc", "*.example.com"] {
            fs::create_dir_all(certs.join(dir)).unwrap();
            fs::write(certs.join(dir).join("fullchain.cer"), b"x").unwrap();
        }
        fs::create_dir_all(certs.join("other.org_ecc")).unwrap();

        let outcome = fx.engine.delete("example.com").await;
        assert!(outcome.success);
        assert!(!certs.join("example.com").exists());
        assert!(!certs.join("example.com_ecc").exists());
        assert!(!certs.join("*.example.com").exists());
        assert!(certs.join("other.org_ecc").exists());
    }

    #[tokio::test]
    async fn delete_without_directories_fails() {
        let fx = fixture();
        let outcome = fx.engine.delete("absent.example").await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Certificate files do not exist");
    }

    #[tokio::test]
    async fn download_packages_first_matching_directory() {
        let fx = fixture();
        let dir = fx.paths.cert_dir().join("example.com_ecc");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("fullchain.cer"), b"chain").unwrap();

        let archive = fx.engine.download("example.com").await.unwrap();
        assert!(archive.exists());
        fs::remove_file(archive).unwrap();

        assert!(fx.engine.download("absent.example").await.is_none());
    }

    #[tokio::test]
    async fn same_domain_operations_are_serialized() {
        let fx = fixture();
        let lock = fx.engine.domain_lock("example.com").await;
        let guard = lock.lock().await;

        let other = fx.engine.domain_lock("other.org").await;
        assert!(other.try_lock().is_ok());

        let same = fx.engine.domain_lock("example.com").await;
        assert!(same.try_lock().is_err());
        drop(guard);
        assert!(same.try_lock().is_ok());
    }

    #[tokio::test]
    async fn health_check_reports_probe_output() {
        let fx = fixture();
        let script = fx.paths.health_script();
        fs::create_dir_all(script.parent().unwrap()).unwrap();
        fs::write(&script, "#!/bin/sh\necho 'all services running'\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let status = fx.engine.health_check().await;
        assert!(status.healthy);
        assert_eq!(status.message.trim(), "all services running");
        assert!(!status.timestamp.is_empty());
    }

    #[tokio::test]
    async fn health_check_survives_missing_probe() {
        let fx = fixture();
        let status = fx.engine.health_check().await;
        assert!(!status.healthy);
        assert!(!status.message.is_empty());
    }
}
