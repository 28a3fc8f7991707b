use crate::config::AppConfig;
use crate::error::Result;
use crate::lock;
use crate::platform::PlatformProfile;
use crate::ui;
use crate::utils::expand_path;

/// Snapshot the managed files. `destination` replaces the backup root.
pub async fn execute(
    profile: &PlatformProfile,
    config: &AppConfig,
    destination: Option<&str>,
) -> Result<bool> {
    ui::header("Backing Up Configurations");

    let _lock = lock::acquire(&profile.home_dir)?;

    let mut manager = super::backup_manager(profile, config);
    if let Some(destination) = destination {
        let root = expand_path(destination);
        ui::info(&format!("Backup location: {}", root.display()));
        manager = manager.with_root(root);
    }

    let result = manager.backup(false);
    if !result.success {
        ui::error(&format!(
            "Backup failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        ));
        return Ok(false);
    }

    if result.files.is_empty() {
        ui::info("No configuration files to backup");
        return Ok(true);
    }

    if let Some(dir) = &result.backup_dir {
        ui::success(&format!("Backup completed: {}", dir.display()));
    }
    ui::info(&format!("Backed up {} files:", result.files.len()));
    for file in &result.files {
        ui::dim(&format!("  - {}", file.display()));
    }

    Ok(true)
}
