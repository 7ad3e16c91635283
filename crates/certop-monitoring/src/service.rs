use std::sync::Arc;

use certop_core::{CommandRunner, StorePaths, DEFAULT_COMMAND_TIMEOUT};
use serde::Serialize;
use utoipa::ToSchema;

/// Point-in-time view of the host and the certificate store.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonitoringSnapshot {
    pub uptime: String,
    #[serde(rename = "lastCheck")]
    pub last_check: String,
    #[serde(rename = "certUpdates")]
    pub cert_updates: usize,
    /// Reserved for time-series data; currently always empty.
    pub charts: serde_json::Value,
}

/// Collects the monitoring snapshot. Every probe is best-effort: a failing
/// source degrades to `"unknown"` or zero, never to an error.
pub struct MonitoringProbe {
    paths: StorePaths,
    runner: Arc<CommandRunner>,
}

impl MonitoringProbe {
    pub fn new(paths: StorePaths, runner: Arc<CommandRunner>) -> Self {
        Self { paths, runner }
    }

    pub async fn snapshot(&self) -> MonitoringSnapshot {
        MonitoringSnapshot {
            uptime: self.uptime().await,
            last_check: self.last_check().await,
            cert_updates: self.cert_store_entries(),
            charts: serde_json::json!({}),
        }
    }

    async fn uptime(&self) -> String {
        let outcome = self.runner.run("uptime", &[], DEFAULT_COMMAND_TIMEOUT).await;
        if outcome.success {
            outcome.stdout.trim().to_string()
        } else {
            "unknown".to_string()
        }
    }

    /// Timestamp the scheduled check job wrote on its last run.
    async fn last_check(&self) -> String {
        match tokio::fs::read_to_string(self.paths.last_check_file()).await {
            Ok(content) => content.trim().to_string(),
            Err(_) => "unknown".to_string(),
        }
    }

    fn cert_store_entries(&self) -> usize {
        std::fs::read_dir(self.paths.cert_dir())
            .map(|entries| entries.filter_map(|e| e.ok()).count())
            .unwrap_or(0)
    }
}
