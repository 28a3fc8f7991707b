pub mod backup;
pub mod check;
pub mod install;
pub mod restore;

use crate::backup::BackupManager;
use crate::config::AppConfig;
use crate::platform::PlatformProfile;

/// Backup manager for the resolved home, honouring a configured backup root.
pub(crate) fn backup_manager(profile: &PlatformProfile, config: &AppConfig) -> BackupManager {
    let manager = BackupManager::new(&profile.home_dir).with_owner(profile.owner);
    match config.backup_root() {
        Some(root) => manager.with_root(root),
        None => manager,
    }
}
