use std::fs;
use std::path::PathBuf;

use crate::error::{BtError, Result};
use crate::platform::{self, Owner};
use crate::templates::{ConfigTemplate, TEMPLATES};
use crate::ui;

/// Writes the bundled configuration templates into a home directory.
pub struct ConfigWriter {
    home: PathBuf,
    templates: Vec<ConfigTemplate>,
    owner: Option<Owner>,
}

impl ConfigWriter {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            templates: TEMPLATES.to_vec(),
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: Option<Owner>) -> Self {
        self.owner = owner;
        self
    }

    pub fn targets(&self) -> Vec<PathBuf> {
        self.templates
            .iter()
            .map(|t| t.target_path(&self.home))
            .collect()
    }

    /// Write every template, replacing whatever is there. Stops at the first
    /// failure; files written before it stay on disk.
    pub fn write_configs(&self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.templates.len());

        for template in &self.templates {
            let target = template.target_path(&self.home);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| BtError::fs(parent, e))?;
            }
            fs::write(&target, template.content).map_err(|e| BtError::fs(&target, e))?;
            platform::hand_over(self.owner, &self.home, &target)?;

            ui::success(&format!("Written ~/{}", template.relative_path));
            written.push(target);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupManager;
    use chrono::TimeZone;

    #[test]
    fn test_writes_templates_verbatim() {
        let temp_dir = tempfile::tempdir().unwrap();
        let writer = ConfigWriter::new(temp_dir.path());

        let written = writer.write_configs().unwrap();
        assert_eq!(written, writer.targets());

        for template in TEMPLATES.iter() {
            let on_disk = fs::read_to_string(temp_dir.path().join(template.relative_path)).unwrap();
            assert_eq!(on_disk, template.content);
        }
    }

    #[test]
    fn test_overwrites_existing_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(".zshrc"), "# hand-written").unwrap();

        let writer = ConfigWriter::new(temp_dir.path());
        writer.write_configs().unwrap();
        writer.write_configs().unwrap();

        assert_eq!(
            fs::read_to_string(temp_dir.path().join(".zshrc")).unwrap(),
            TEMPLATES[0].content
        );
    }

    #[test]
    fn test_creates_parent_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = temp_dir.path().join("fresh-home");

        ConfigWriter::new(&home).write_configs().unwrap();
        assert!(home.join(".config/eza/tokyonight.yml").is_file());
    }

    #[test]
    fn test_failure_keeps_earlier_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        // A plain file where ~/.config must be a directory.
        fs::write(temp_dir.path().join(".config"), "").unwrap();

        let err = ConfigWriter::new(temp_dir.path()).write_configs().unwrap_err();
        assert!(matches!(err, BtError::Filesystem { .. }));

        assert!(temp_dir.path().join(".zshrc").is_file());
        assert!(temp_dir.path().join(".antigenrc").is_file());
        assert!(temp_dir.path().join(".tmux.conf").is_file());
    }

    #[test]
    fn test_backup_write_restore_scenario() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = temp_dir.path();
        fs::write(home.join(".zshrc"), "OLD").unwrap();

        let manager = BackupManager::new(home);
        let now = chrono::Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let result = manager.backup_at(false, now);
        assert!(result.success);
        assert_eq!(result.files, vec![home.join(".zshrc")]);
        let backup_dir = result.backup_dir.unwrap();
        assert_eq!(
            backup_dir,
            home.join(".better-terminal-backups").join("2024-01-15-103000")
        );

        ConfigWriter::new(home).write_configs().unwrap();
        assert_eq!(
            fs::read_to_string(home.join(".zshrc")).unwrap(),
            TEMPLATES[0].content
        );

        let restored = manager.restore(&backup_dir).unwrap();
        assert_eq!(restored, vec![home.join(".zshrc")]);

        assert_eq!(fs::read_to_string(home.join(".zshrc")).unwrap(), "OLD");
        for template in &TEMPLATES[1..] {
            assert_eq!(
                fs::read_to_string(template.target_path(home)).unwrap(),
                template.content,
                "{} should keep the written template",
                template.relative_path
            );
        }
    }
}
