//! Snapshots of the managed configuration files.
//!
//! A backup is a directory named after the UTC time it was taken
//! (`2024-01-15-103000`) holding copies of the tracked files at their
//! home-relative paths, plus a `manifest.json` describing them.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BtError, Result};
use crate::platform::{self, Owner};
use crate::templates;

pub const BACKUP_DIR_NAME: &str = ".better-terminal-backups";
pub const MANIFEST_FILE: &str = "manifest.json";
/// Second resolution, no colons, sorts lexicographically.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestEntry {
    /// Live path the copy was taken from
    pub original: PathBuf,
    /// Path relative to home, also the copy's path inside the backup
    pub relative: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupManifest {
    pub timestamp: String,
    pub source_root: PathBuf,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<ManifestEntry>,
}

impl BackupManifest {
    pub fn load(backup_dir: &Path) -> Result<Option<Self>> {
        let path = backup_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| BtError::fs(&path, e))?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Add `entries`, replacing any existing entry with the same relative path.
    fn merge(&mut self, entries: Vec<ManifestEntry>) {
        for entry in entries {
            self.entries.retain(|e| e.relative != entry.relative);
            self.entries.push(entry);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackupResult {
    pub success: bool,
    pub backup_dir: Option<PathBuf>,
    /// Live paths that were copied
    pub files: Vec<PathBuf>,
    pub error: Option<String>,
}

impl BackupResult {
    fn skipped() -> Self {
        Self {
            success: true,
            backup_dir: None,
            files: Vec::new(),
            error: None,
        }
    }
}

pub struct BackupManager {
    home: PathBuf,
    root: PathBuf,
    tracked: Vec<PathBuf>,
    owner: Option<Owner>,
}

impl BackupManager {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            root: home.join(BACKUP_DIR_NAME),
            home,
            tracked: templates::tracked_paths(),
            owner: None,
        }
    }

    /// Store backups under `root` instead of `<home>/.better-terminal-backups`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_owner(mut self, owner: Option<Owner>) -> Self {
        self.owner = owner;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup(&self, skip: bool) -> BackupResult {
        self.backup_at(skip, Utc::now())
    }

    pub fn backup_at(&self, skip: bool, now: DateTime<Utc>) -> BackupResult {
        if skip {
            return BackupResult::skipped();
        }

        match self.snapshot(now) {
            Ok((dir, files)) => {
                tracing::debug!("Backed up {} files to {}", files.len(), dir.display());
                BackupResult {
                    success: true,
                    backup_dir: Some(dir),
                    files,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!("Backup failed: {}", e);
                BackupResult {
                    success: false,
                    backup_dir: None,
                    files: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn snapshot(&self, now: DateTime<Utc>) -> Result<(PathBuf, Vec<PathBuf>)> {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let dir = self.root.join(&timestamp);
        fs::create_dir_all(&dir).map_err(|e| BtError::fs(&dir, e))?;

        let mut files = Vec::new();
        let mut entries = Vec::new();

        for relative in &self.tracked {
            let source = self.home.join(relative);
            if !source.is_file() {
                continue;
            }

            let dest = dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| BtError::fs(parent, e))?;
            }
            fs::copy(&source, &dest).map_err(|e| BtError::fs(&source, e))?;
            platform::hand_over(self.owner, &self.home, &dest)?;

            files.push(source.clone());
            entries.push(ManifestEntry {
                original: source,
                relative: relative.clone(),
            });
        }

        let mut manifest = BackupManifest::load(&dir)?.unwrap_or_else(|| BackupManifest {
            timestamp,
            source_root: self.home.clone(),
            created_at: now,
            entries: Vec::new(),
        });
        manifest.merge(entries);

        let manifest_path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(&manifest)?;
        fs::write(&manifest_path, json).map_err(|e| BtError::fs(&manifest_path, e))?;
        platform::hand_over(self.owner, &self.home, &manifest_path)?;

        Ok((dir, files))
    }

    /// Copy every tracked file found in `backup_dir` back to its live path.
    /// Live files without a copy are left alone.
    pub fn restore(&self, backup_dir: &Path) -> Result<Vec<PathBuf>> {
        if !backup_dir.is_dir() {
            return Err(BtError::fs(
                backup_dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "backup directory not found"),
            ));
        }

        let mut restored = Vec::new();
        for relative in &self.tracked {
            let source = backup_dir.join(relative);
            if !source.is_file() {
                continue;
            }

            let dest = self.home.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| BtError::fs(parent, e))?;
            }
            fs::copy(&source, &dest).map_err(|e| BtError::fs(&dest, e))?;
            platform::hand_over(self.owner, &self.home, &dest)?;

            tracing::debug!("Restored {}", dest.display());
            restored.push(dest);
        }

        Ok(restored)
    }

    /// Backup directories under the root, oldest first.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut dirs: Vec<PathBuf> = fs::read_dir(&self.root)
            .map_err(|e| BtError::fs(&self.root, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| NaiveDateTime::parse_from_str(n, TIMESTAMP_FORMAT).is_ok())
            })
            .collect();
        dirs.sort();
        Ok(dirs)
    }

    pub fn latest(&self) -> Result<Option<PathBuf>> {
        Ok(self.list()?.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, s).unwrap()
    }

    fn write(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_skip_does_no_io() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = BackupManager::new(temp_dir.path());

        let result = manager.backup(true);
        assert!(result.success);
        assert!(result.files.is_empty());
        assert!(result.backup_dir.is_none());
        assert!(!manager.root().exists());
    }

    #[test]
    fn test_home_scenario() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = temp_dir.path();
        write(&home.join(".zshrc"), b"A");

        let manager = BackupManager::new(home);
        let result = manager.backup_at(false, at(10, 30, 0));

        let expected_dir = home.join(".better-terminal-backups").join("2024-01-15-103000");
        assert!(result.success);
        assert_eq!(result.backup_dir, Some(expected_dir.clone()));
        assert_eq!(result.files, vec![home.join(".zshrc")]);
        assert_eq!(fs::read(expected_dir.join(".zshrc")).unwrap(), b"A");
        assert!(!expected_dir.join(".tmux.conf").exists());
    }

    #[test]
    fn test_copies_are_byte_identical() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = temp_dir.path();
        let binary: Vec<u8> = (0..=255u8).chain([0, 0xff, b'\n', b'\r']).collect();
        write(&home.join(".tmux.conf"), &binary);
        write(&home.join(".config/eza/tokyonight.yml"), b"colourful: true\n");

        let manager = BackupManager::new(home);
        let result = manager.backup_at(false, at(8, 0, 1));
        let dir = result.backup_dir.unwrap();

        assert_eq!(fs::read(dir.join(".tmux.conf")).unwrap(), binary);
        assert_eq!(
            fs::read(dir.join(".config/eza/tokyonight.yml")).unwrap(),
            b"colourful: true\n"
        );
    }

    #[test]
    fn test_manifest_lists_copied_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = temp_dir.path();
        write(&home.join(".zshrc"), b"z");
        write(&home.join(".antigenrc"), b"a");

        let manager = BackupManager::new(home);
        let dir = manager.backup_at(false, at(9, 0, 0)).backup_dir.unwrap();

        let manifest = BackupManifest::load(&dir).unwrap().unwrap();
        assert_eq!(manifest.timestamp, "2024-01-15-090000");
        assert_eq!(manifest.source_root, home.to_path_buf());
        assert_eq!(
            manifest.entries,
            vec![
                ManifestEntry {
                    original: home.join(".zshrc"),
                    relative: PathBuf::from(".zshrc"),
                },
                ManifestEntry {
                    original: home.join(".antigenrc"),
                    relative: PathBuf::from(".antigenrc"),
                },
            ]
        );
    }

    #[test]
    fn test_same_second_backups_merge() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = temp_dir.path();
        write(&home.join(".zshrc"), b"first");

        let manager = BackupManager::new(home);
        manager.backup_at(false, at(12, 0, 0));

        write(&home.join(".zshrc"), b"second");
        write(&home.join(".tmux.conf"), b"tmux");
        let result = manager.backup_at(false, at(12, 0, 0));
        let dir = result.backup_dir.unwrap();

        assert_eq!(fs::read(dir.join(".zshrc")).unwrap(), b"second");
        let manifest = BackupManifest::load(&dir).unwrap().unwrap();
        let relatives: Vec<_> = manifest.entries.iter().map(|e| e.relative.clone()).collect();
        assert_eq!(relatives, vec![PathBuf::from(".zshrc"), PathBuf::from(".tmux.conf")]);
        assert_eq!(manager.list().unwrap().len(), 1);
    }

    #[test]
    fn test_failure_reports_no_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = temp_dir.path();
        write(&home.join(".zshrc"), b"z");
        // A file where the backup root should be.
        write(&home.join("blocked"), b"");

        let manager = BackupManager::new(home).with_root(home.join("blocked"));
        let result = manager.backup_at(false, at(1, 2, 3));

        assert!(!result.success);
        assert!(result.backup_dir.is_none());
        assert!(result.files.is_empty());
        assert!(result.error.is_some());
    }

    #[test]
    fn test_round_trip_restores_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = temp_dir.path();
        write(&home.join(".zshrc"), b"original zshrc");
        write(&home.join(".config/eza/tokyonight.yml"), b"original theme");

        let manager = BackupManager::new(home);
        let dir = manager.backup_at(false, at(7, 7, 7)).backup_dir.unwrap();

        write(&home.join(".zshrc"), b"overwritten");
        fs::remove_file(home.join(".config/eza/tokyonight.yml")).unwrap();

        let restored = manager.restore(&dir).unwrap();
        assert_eq!(
            restored,
            vec![home.join(".zshrc"), home.join(".config/eza/tokyonight.yml")]
        );
        assert_eq!(fs::read(home.join(".zshrc")).unwrap(), b"original zshrc");
        assert_eq!(
            fs::read(home.join(".config/eza/tokyonight.yml")).unwrap(),
            b"original theme"
        );
    }

    #[test]
    fn test_restore_never_deletes_live_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = temp_dir.path();
        write(&home.join(".zshrc"), b"z");

        let manager = BackupManager::new(home);
        let dir = manager.backup_at(false, at(3, 0, 0)).backup_dir.unwrap();

        write(&home.join(".tmux.conf"), b"new since backup");
        manager.restore(&dir).unwrap();

        assert_eq!(fs::read(home.join(".tmux.conf")).unwrap(), b"new since backup");
    }

    #[test]
    fn test_restore_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = BackupManager::new(temp_dir.path());

        let err = manager
            .restore(&temp_dir.path().join("2020-01-01-000000"))
            .unwrap_err();
        assert!(matches!(err, BtError::Filesystem { .. }));
    }

    #[test]
    fn test_list_sorted_and_filtered() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = temp_dir.path();
        let manager = BackupManager::new(home);

        assert!(manager.list().unwrap().is_empty());
        assert!(manager.latest().unwrap().is_none());

        manager.backup_at(false, at(11, 0, 0));
        manager.backup_at(false, at(9, 0, 0));
        fs::create_dir_all(manager.root().join("not-a-backup")).unwrap();
        write(&manager.root().join("2024-01-15-230000"), b"a file, not a dir");

        let names: Vec<String> = manager
            .list()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["2024-01-15-090000", "2024-01-15-110000"]);
        assert_eq!(
            manager.latest().unwrap(),
            Some(manager.root().join("2024-01-15-110000"))
        );
    }

    #[test]
    fn test_custom_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = temp_dir.path().join("home");
        write(&home.join(".antigenrc"), b"antigen apply\n");

        let manager = BackupManager::new(&home).with_root(temp_dir.path().join("elsewhere"));
        let dir = manager.backup_at(false, at(0, 0, 0)).backup_dir.unwrap();

        assert_eq!(dir, temp_dir.path().join("elsewhere").join("2024-01-15-000000"));
        assert!(dir.join(".antigenrc").is_file());
    }
}
