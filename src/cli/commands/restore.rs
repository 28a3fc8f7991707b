use crate::config::AppConfig;
use crate::error::Result;
use crate::lock;
use crate::platform::PlatformProfile;
use crate::ui;
use crate::utils::expand_path;

pub async fn execute(
    profile: &PlatformProfile,
    config: &AppConfig,
    backup_path: &str,
) -> Result<bool> {
    ui::header("Restoring Configurations");

    let _lock = lock::acquire(&profile.home_dir)?;

    let dir = expand_path(backup_path);
    ui::info(&format!("Restoring from: {}", dir.display()));

    let manager = super::backup_manager(profile, config);
    match manager.restore(&dir) {
        Ok(restored) if restored.is_empty() => {
            ui::warn("The backup contains no configuration files");
            Ok(true)
        }
        Ok(restored) => {
            for path in &restored {
                ui::success(&format!("Restored {}", path.display()));
            }
            ui::info("Please restart your shell or run: source ~/.zshrc");
            Ok(true)
        }
        Err(e) => {
            ui::error(&format!("Failed to restore configurations: {}", e));
            if let Ok(available) = manager.list() {
                if !available.is_empty() {
                    ui::info("Available backups:");
                    for backup in available.iter().rev().take(5) {
                        ui::dim(&format!("  {}", backup.display()));
                    }
                }
            }
            Ok(false)
        }
    }
}
