//! Zip packaging of certificate directories for download

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::errors::PackageError;

// Certificate directories are flat in practice; the cap only bounds
// pathological layouts such as symlink cycles.
const MAX_WALK_DEPTH: usize = 8;

/// Bundles a certificate directory into a zip archive on disk.
///
/// Entries use paths relative to the packaged directory, so the archive
/// extracts to `fullchain.cer`, `domain.key`, ... without a wrapping
/// directory component.
#[derive(Debug, Clone, Default)]
pub struct ArtifactPackager;

impl ArtifactPackager {
    pub fn new() -> Self {
        Self
    }

    /// Package every regular file under `dir` into a zip archive and return
    /// the archive path. The caller owns the returned file and is expected
    /// to remove it after streaming.
    pub fn package(&self, dir: &Path) -> Result<PathBuf, PackageError> {
        if !dir.is_dir() {
            return Err(PackageError::NotADirectory(dir.display().to_string()));
        }

        let temp = tempfile::Builder::new()
            .prefix("certop-archive-")
            .suffix(".zip")
            .tempfile()?;

        let mut writer = ZipWriter::new(temp.reopen()?);
        let options = SimpleFileOptions::default();
        self.add_directory(&mut writer, dir, dir, options, 0)?;
        writer.finish()?;

        let path = temp
            .into_temp_path()
            .keep()
            .map_err(|e| PackageError::Persist(e.to_string()))?;
        debug!(dir = %dir.display(), archive = %path.display(), "packaged certificate directory");
        Ok(path)
    }

    fn add_directory(
        &self,
        writer: &mut ZipWriter<File>,
        root: &Path,
        dir: &Path,
        options: SimpleFileOptions,
        depth: usize,
    ) -> Result<(), PackageError> {
        if depth > MAX_WALK_DEPTH {
            return Ok(());
        }

        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect();
        entries.sort();

        for path in entries {
            if path.is_dir() {
                self.add_directory(writer, root, &path, options, depth + 1)?;
            } else if path.is_file() {
                let relative = path
                    .strip_prefix(root)
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_else(|_| path.display().to_string());
                writer.start_file(relative, options)?;
                let mut contents = Vec::new();
                File::open(&path)?.read_to_end(&mut contents)?;
                writer.write_all(&contents)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn archive_names(archive: &Path) -> Vec<String> {
        let file = File::open(archive).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let mut names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn archives_files_with_relative_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let cert_dir = tmp.path().join("example.com_ecc");
        fs::create_dir_all(cert_dir.join("backup")).unwrap();
        fs::write(cert_dir.join("fullchain.cer"), b"chain").unwrap();
        fs::write(cert_dir.join("example.com.key"), b"key").unwrap();
        fs::write(cert_dir.join("backup/fullchain.cer"), b"old").unwrap();

        let archive = ArtifactPackager::new().package(&cert_dir).unwrap();
        assert_eq!(
            archive_names(&archive),
            vec![
                "backup/fullchain.cer".to_string(),
                "example.com.key".to_string(),
                "fullchain.cer".to_string(),
            ]
        );
        fs::remove_file(archive).unwrap();
    }

    #[test]
    fn archive_content_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let cert_dir = tmp.path().join("example.com");
        fs::create_dir_all(&cert_dir).unwrap();
        fs::write(cert_dir.join("fullchain.cer"), b"pem bytes").unwrap();

        let archive = ArtifactPackager::new().package(&cert_dir).unwrap();
        let file = File::open(&archive).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let mut entry = zip.by_name("fullchain.cer").unwrap();
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "pem bytes");
        drop(entry);
        drop(zip);
        fs::remove_file(archive).unwrap();
    }

    #[test]
    fn rejects_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let result = ArtifactPackager::new().package(&tmp.path().join("absent"));
        assert!(matches!(result, Err(PackageError::NotADirectory(_))));
    }
}
