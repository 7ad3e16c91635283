//! Certificate artifact resolution
//!
//! The provisioning tool stores certificates in one subdirectory per domain,
//! in several possible layouts: plain and `_ecc`-suffixed directories, plus
//! wildcard-alias directories literally named `*.domain` (often symlinks to
//! the real directory). Resolution walks a fixed, ordered list of candidate
//! patterns and short-circuits on the first pattern with at least one match,
//! so exactly one artifact is authoritative per call.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use certop_core::{CommandOutcome, CommandRunner};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::{debug, warn};

use crate::models::{CertAlgorithm, CertKind, CertStatus, CertificateRecord, ExpiryDays};

const FULLCHAIN_FILE: &str = "fullchain.cer";
const INSPECT_TIMEOUT: Duration = Duration::from_secs(300);

/// Locates and classifies certificate artifacts in the store directory.
pub struct CertificateResolver {
    cert_dir: PathBuf,
    runner: Arc<CommandRunner>,
}

impl CertificateResolver {
    pub fn new(cert_dir: PathBuf, runner: Arc<CommandRunner>) -> Self {
        Self { cert_dir, runner }
    }

    /// Resolve the authoritative certificate file for `domain`.
    ///
    /// Search order (first pattern with a match wins; within a pattern the
    /// lexicographically-first match is used):
    /// 1. `{d}_ecc/fullchain.cer`
    /// 2. `{d}_ecc/{d}.cer`
    /// 3. `{d}/fullchain.cer`
    /// 4. `{d}/{d}.cer`
    /// 5. `*.{d}_ecc/fullchain.cer`
    /// 6. `*.{d}_ecc/*.{d}.cer`
    /// 7. `*.{d}/fullchain.cer`
    /// 8. `*.{d}/*.{d}.cer`
    pub fn locate(&self, domain: &str) -> Option<PathBuf> {
        let ecc_dir = format!("{}_ecc", domain);
        let own_cer = format!("{}.cer", domain);
        let alias_ecc_suffix = format!(".{}_ecc", domain);
        let alias_suffix = format!(".{}", domain);
        let alias_cer_suffix = format!(".{}.cer", domain);

        let candidates: [Vec<PathBuf>; 8] = [
            self.exact_file(&ecc_dir, FULLCHAIN_FILE),
            self.exact_file(&ecc_dir, &own_cer),
            self.exact_file(domain, FULLCHAIN_FILE),
            self.exact_file(domain, &own_cer),
            self.alias_dir_files(&alias_ecc_suffix, Some(FULLCHAIN_FILE)),
            self.alias_dir_matching_files(&alias_ecc_suffix, &alias_cer_suffix),
            self.alias_dir_files(&alias_suffix, Some(FULLCHAIN_FILE)),
            self.alias_dir_matching_files(&alias_suffix, &alias_cer_suffix),
        ];

        for mut matches in candidates {
            if !matches.is_empty() {
                matches.sort();
                return Some(matches.swap_remove(0));
            }
        }
        None
    }

    /// Resolve and classify: locate the artifact, inspect its end-validity
    /// date, and derive status/type/algorithm.
    pub async fn resolve(&self, domain: &str) -> CertificateRecord {
        let Some(cert_path) = self.locate(domain) else {
            debug!(domain, "no certificate artifact resolved");
            return CertificateRecord::not_found(domain);
        };

        let mut record = base_record(domain, &cert_path);
        let outcome = self.inspect(&cert_path).await;
        if !outcome.success {
            warn!(
                domain,
                path = %cert_path.display(),
                stderr = %outcome.stderr,
                "certificate inspection failed"
            );
            record.status = CertStatus::Error;
            record.error = Some("Unable to read certificate information".to_string());
            return record;
        }

        classify(&mut record, &outcome.stdout);
        record
    }

    /// Every store directory belonging to `domain`, in priority order:
    /// `{d}_ecc`, `{d}`, then the wildcard-alias variants. Shared by the
    /// delete and download operations.
    pub fn matching_directories(&self, domain: &str) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for dir in [
            self.cert_dir.join(format!("{}_ecc", domain)),
            self.cert_dir.join(domain),
        ] {
            if dir.is_dir() {
                dirs.push(dir);
            }
        }
        for suffix in [format!(".{}_ecc", domain), format!(".{}", domain)] {
            let mut aliases = self.dirs_with_suffix(&suffix);
            aliases.sort();
            dirs.extend(aliases);
        }
        dirs
    }

    /// First directory match, or `None` when the domain has no store
    /// directory at all.
    pub fn locate_directory(&self, domain: &str) -> Option<PathBuf> {
        self.matching_directories(domain).into_iter().next()
    }

    fn exact_file(&self, dir_name: &str, file_name: &str) -> Vec<PathBuf> {
        let path = self.cert_dir.join(dir_name).join(file_name);
        if path.is_file() {
            vec![path]
        } else {
            Vec::new()
        }
    }

    /// Directories whose name ends with `suffix` (glob `*.{d}`; the leading
    /// component may be anything, including the literal `*` the provisioning
    /// tool uses for wildcard directories).
    fn dirs_with_suffix(&self, suffix: &str) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.cert_dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().ends_with(suffix))
                    .unwrap_or(false)
            })
            .collect()
    }

    fn alias_dir_files(&self, dir_suffix: &str, file_name: Option<&str>) -> Vec<PathBuf> {
        self.dirs_with_suffix(dir_suffix)
            .into_iter()
            .filter_map(|dir| {
                let path = dir.join(file_name?);
                path.is_file().then_some(path)
            })
            .collect()
    }

    fn alias_dir_matching_files(&self, dir_suffix: &str, file_suffix: &str) -> Vec<PathBuf> {
        let mut matches = Vec::new();
        for dir in self.dirs_with_suffix(dir_suffix) {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for path in entries.filter_map(|e| e.ok()).map(|e| e.path()) {
                let is_match = path.is_file()
                    && path
                        .file_name()
                        .map(|name| name.to_string_lossy().ends_with(file_suffix))
                        .unwrap_or(false);
                if is_match {
                    matches.push(path);
                }
            }
        }
        matches
    }

    async fn inspect(&self, cert_path: &Path) -> CommandOutcome {
        let path_arg = cert_path.display().to_string();
        self.runner
            .run(
                "openssl",
                &[
                    "x509", "-in", &path_arg, "-noout", "-enddate", "-subject", "-issuer",
                ],
                INSPECT_TIMEOUT,
            )
            .await
    }
}

/// Record with everything derivable from the resolved path alone: coverage
/// and algorithm come from the `*.`/`_ecc` markers, expiry is still
/// undetermined.
fn base_record(domain: &str, cert_path: &Path) -> CertificateRecord {
    let path_str = cert_path.display().to_string();
    let is_wildcard = path_str.contains("*.") || path_str.to_lowercase().contains("wildcard");

    CertificateRecord {
        domain: domain.to_string(),
        kind: if is_wildcard {
            CertKind::Wildcard
        } else {
            CertKind::Single
        },
        algorithm: if path_str.contains("_ecc") {
            CertAlgorithm::Ecc
        } else {
            CertAlgorithm::Rsa
        },
        expiry_date: "undefined".to_string(),
        days_remaining: ExpiryDays::undefined(),
        status: CertStatus::Unknown,
        error: None,
        cert_path: Some(path_str),
        custom_configs: Default::default(),
    }
}

/// Fill expiry and status from the openssl inspection output.
fn classify(record: &mut CertificateRecord, inspect_output: &str) {
    let Some(raw_expiry) = inspect_output
        .lines()
        .find_map(|line| line.strip_prefix("notAfter="))
    else {
        return;
    };

    match parse_not_after(raw_expiry) {
        Some(expiry) => {
            let days = (expiry - Utc::now()).num_days();
            record.expiry_date = expiry.format("%Y-%m-%d").to_string();
            record.days_remaining = ExpiryDays::Days(days);
            record.status = CertStatus::from_days_remaining(days);
        }
        None => {
            record.expiry_date = raw_expiry.trim().to_string();
            record.days_remaining = ExpiryDays::unknown();
            record.status = CertStatus::Unknown;
        }
    }
}

/// Parse an openssl end-validity timestamp, format
/// `<Mon> <DD> <HH:MM:SS> <YYYY> <TZ>` (day-of-month may be space-padded).
/// The trailing timezone token is treated as UTC.
pub fn parse_not_after(raw: &str) -> Option<DateTime<Utc>> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.len() < 4 {
        return None;
    }
    let normalized = tokens[..4].join(" ");
    NaiveDateTime::parse_from_str(&normalized, "%b %d %H:%M:%S %Y")
        .ok()
        .map(|dt| Utc.from_utc_datetime(&dt))
}
