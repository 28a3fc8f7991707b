//! Configuration files written into the user's home.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigTemplate {
    /// Path relative to the home directory
    pub relative_path: &'static str,
    pub content: &'static str,
}

impl ConfigTemplate {
    pub fn target_path(&self, home: &Path) -> PathBuf {
        home.join(self.relative_path)
    }
}

pub const TEMPLATES: [ConfigTemplate; 4] = [
    ConfigTemplate {
        relative_path: ".zshrc",
        content: include_str!("zshrc"),
    },
    ConfigTemplate {
        relative_path: ".antigenrc",
        content: include_str!("antigenrc"),
    },
    ConfigTemplate {
        relative_path: ".tmux.conf",
        content: include_str!("tmux.conf"),
    },
    ConfigTemplate {
        relative_path: ".config/eza/tokyonight.yml",
        content: include_str!("eza-tokyonight.yml"),
    },
];

/// Relative paths of every managed file. These are also the files the backup
/// manager snapshots.
pub fn tracked_paths() -> Vec<PathBuf> {
    TEMPLATES
        .iter()
        .map(|t| PathBuf::from(t.relative_path))
        .collect()
}
