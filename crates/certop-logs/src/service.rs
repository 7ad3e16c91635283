use std::path::PathBuf;
use std::str::FromStr;

use certop_core::StorePaths;
use tracing::info;

/// Lines returned by a tail request.
const TAIL_LINES: usize = 1000;

/// The log files the provisioning tool and its cron jobs write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    CertManager,
    Error,
    Cron,
}

impl LogKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            LogKind::CertManager => "cert-manager.log",
            LogKind::Error => "cert-manager-error.log",
            LogKind::Cron => "cron.log",
        }
    }
}

impl FromStr for LogKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cert-manager" => Ok(LogKind::CertManager),
            "error" => Ok(LogKind::Error),
            "cron" => Ok(LogKind::Cron),
            _ => Err(()),
        }
    }
}

/// Tail and clear access to the log directory.
pub struct LogStore {
    paths: StorePaths,
}

impl LogStore {
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }

    fn log_path(&self, kind: LogKind) -> PathBuf {
        self.paths.log_dir().join(kind.file_name())
    }

    /// Last 1000 lines of a log file; `None` when the file does not exist.
    pub async fn tail(&self, kind: LogKind) -> std::io::Result<Option<String>> {
        let path = self.log_path(kind);
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(TAIL_LINES);
        Ok(Some(lines[start..].join("\n")))
    }

    /// Truncate a log file. Clearing a file that does not exist is a no-op.
    pub async fn clear(&self, kind: LogKind) -> std::io::Result<()> {
        let path = self.log_path(kind);
        if path.exists() {
            tokio::fs::write(&path, "").await?;
            info!(log = kind.file_name(), "log file cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(tmp: &tempfile::TempDir) -> LogStore {
        let paths = StorePaths::new(
            tmp.path().join("config"),
            tmp.path().join("data"),
            tmp.path().join("scripts"),
        );
        std::fs::create_dir_all(paths.log_dir()).unwrap();
        LogStore::new(paths)
    }

    fn write_log(tmp: &tempfile::TempDir, name: &str, content: &str) {
        std::fs::write(tmp.path().join("data/logs").join(name), content).unwrap();
    }

    #[test]
    fn log_kind_parsing() {
        assert_eq!("cert-manager".parse(), Ok(LogKind::CertManager));
        assert_eq!("error".parse(), Ok(LogKind::Error));
        assert_eq!("cron".parse(), Ok(LogKind::Cron));
        assert!("access".parse::<LogKind>().is_err());
    }

    #[tokio::test]
    async fn tail_returns_whole_file_when_short() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(&tmp);
        write_log(&tmp, "cron.log", "line 1\nline 2\n");

        let content = store.tail(LogKind::Cron).await.unwrap().unwrap();
        assert_eq!(content, "line 1\nline 2");
    }

    #[tokio::test]
    async fn tail_caps_at_the_last_thousand_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(&tmp);
        let content: String = (0..1500).map(|i| format!("line {}\n", i)).collect();
        write_log(&tmp, "cert-manager.log", &content);

        let tailed = store.tail(LogKind::CertManager).await.unwrap().unwrap();
        assert_eq!(tailed.lines().count(), 1000);
        assert!(tailed.starts_with("line 500"));
        assert!(tailed.ends_with("line 1499"));
    }

    #[tokio::test]
    async fn tail_of_missing_file_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(&tmp);
        assert!(store.tail(LogKind::Error).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_truncates_and_tolerates_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(&tmp);
        write_log(&tmp, "cron.log", "old entries\n");

        store.clear(LogKind::Cron).await.unwrap();
        assert_eq!(store.tail(LogKind::Cron).await.unwrap().unwrap(), "");

        store.clear(LogKind::Error).await.unwrap();
    }
}
