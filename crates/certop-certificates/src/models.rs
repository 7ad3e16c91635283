use std::collections::BTreeMap;
use std::path::Path;

use certop_config::SubdomainConfig;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health classification of a domain's certificate.
///
/// The numeric-threshold states (`expired`/`warning`/`healthy`) are a pure
/// function of the remaining days; the others describe resolution failures
/// and are never produced from a parsed expiry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CertStatus {
    NotFound,
    Error,
    Expired,
    Warning,
    Healthy,
    Unknown,
}

impl CertStatus {
    /// Classify by signed days remaining: `<=0` expired, `1..=30` warning,
    /// `>30` healthy.
    pub fn from_days_remaining(days: i64) -> Self {
        if days <= 0 {
            CertStatus::Expired
        } else if days <= 30 {
            CertStatus::Warning
        } else {
            CertStatus::Healthy
        }
    }

    /// Whether an artifact was resolved and readable.
    pub fn artifact_exists(&self) -> bool {
        !matches!(self, CertStatus::NotFound | CertStatus::Error)
    }

    /// Whether this certificate needs operator attention.
    pub fn is_expiring(&self) -> bool {
        matches!(self, CertStatus::Warning | CertStatus::Expired)
    }
}

/// Certificate coverage, derived from the resolved artifact's path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CertKind {
    Single,
    Wildcard,
}

/// Key algorithm family, derived from the resolved artifact's path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum CertAlgorithm {
    #[serde(rename = "ECC")]
    Ecc,
    #[serde(rename = "RSA")]
    Rsa,
    #[serde(rename = "undefined")]
    Undefined,
}

/// Days until expiry: a signed number once the expiry parsed, otherwise a
/// text marker (`"undefined"` without an artifact, `"unknown"` when the
/// expiry line did not parse).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(untagged)]
pub enum ExpiryDays {
    Days(i64),
    Text(String),
}

impl ExpiryDays {
    pub fn undefined() -> Self {
        ExpiryDays::Text("undefined".to_string())
    }

    pub fn unknown() -> Self {
        ExpiryDays::Text("unknown".to_string())
    }

    pub fn as_days(&self) -> Option<i64> {
        match self {
            ExpiryDays::Days(d) => Some(*d),
            ExpiryDays::Text(_) => None,
        }
    }
}

/// Deployment metadata attached to a subdomain in the inventory view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CustomConfig {
    pub deploy_dir: String,
    pub cert_filename: String,
    pub key_filename: String,
    pub deploy_method: String,
}

impl From<&SubdomainConfig> for CustomConfig {
    fn from(sub: &SubdomainConfig) -> Self {
        Self {
            deploy_dir: sub.deploy_dir.clone().unwrap_or_default(),
            cert_filename: sub.cert_filename.clone().unwrap_or_default(),
            key_filename: sub.key_filename.clone().unwrap_or_default(),
            deploy_method: sub.effective_deploy_method().to_string(),
        }
    }
}

/// Classified state of one domain's certificate. Ephemeral: recomputed from
/// the filesystem on every call, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CertificateRecord {
    pub domain: String,
    #[serde(rename = "type")]
    pub kind: CertKind,
    pub algorithm: CertAlgorithm,
    #[serde(rename = "expiryDate")]
    pub expiry_date: String,
    #[serde(rename = "daysRemaining")]
    pub days_remaining: ExpiryDays,
    pub status: CertStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Path of the resolved artifact; absent when nothing resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<String>,
    #[serde(default)]
    pub custom_configs: BTreeMap<String, CustomConfig>,
}

impl CertificateRecord {
    /// Record for a domain with no certificate artifact on disk.
    pub fn not_found(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            kind: CertKind::Single,
            algorithm: CertAlgorithm::Undefined,
            expiry_date: "undefined".to_string(),
            days_remaining: ExpiryDays::undefined(),
            status: CertStatus::NotFound,
            error: Some("Certificate file does not exist".to_string()),
            cert_path: None,
            custom_configs: BTreeMap::new(),
        }
    }

    /// Directory holding the resolved artifact, empty when unresolved.
    pub fn cert_dir(&self) -> String {
        self.cert_path
            .as_deref()
            .and_then(|p| Path::new(p).parent())
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_thresholds_at_boundaries() {
        assert_eq!(CertStatus::from_days_remaining(-5), CertStatus::Expired);
        assert_eq!(CertStatus::from_days_remaining(0), CertStatus::Expired);
        assert_eq!(CertStatus::from_days_remaining(1), CertStatus::Warning);
        assert_eq!(CertStatus::from_days_remaining(30), CertStatus::Warning);
        assert_eq!(CertStatus::from_days_remaining(31), CertStatus::Healthy);
        assert_eq!(CertStatus::from_days_remaining(365), CertStatus::Healthy);
    }

    #[test]
    fn artifact_existence_by_status() {
        assert!(!CertStatus::NotFound.artifact_exists());
        assert!(!CertStatus::Error.artifact_exists());
        assert!(CertStatus::Expired.artifact_exists());
        assert!(CertStatus::Unknown.artifact_exists());
        assert!(CertStatus::Healthy.artifact_exists());
    }

    #[test]
    fn not_found_record_wire_shape() {
        let record = CertificateRecord::not_found("missing.example");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["status"], "not_found");
        assert_eq!(json["expiryDate"], "undefined");
        assert_eq!(json["daysRemaining"], "undefined");
        assert_eq!(json["algorithm"], "undefined");
        assert_eq!(json["type"], "single");
        assert!(json.get("cert_path").is_none());
    }

    #[test]
    fn days_remaining_serializes_as_number_when_known() {
        let days = ExpiryDays::Days(42);
        assert_eq!(serde_json::to_value(&days).unwrap(), serde_json::json!(42));
    }

    #[test]
    fn cert_dir_is_parent_of_artifact() {
        let mut record = CertificateRecord::not_found("example.com");
        assert_eq!(record.cert_dir(), "");

        record.cert_path = Some("/data/certs/example.com_ecc/fullchain.cer".to_string());
        assert_eq!(record.cert_dir(), "/data/certs/example.com_ecc");
    }
}
