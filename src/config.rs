use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BtError, Result};

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "BETTER_TERMINAL_CONFIG";

/// User-tunable settings. Every field has a default, so the file is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Git tag of asdf to clone
    pub asdf_version: String,
    /// Node.js version passed to `asdf install nodejs`
    pub node_version: String,
    /// Release tag of the Nerd Fonts archive
    pub nerd_font_version: String,
    /// carapace release used when the GitHub API cannot be queried
    pub carapace_fallback_version: String,
    /// URL probed by `check` for outbound connectivity
    pub connectivity_url: String,
    /// Directory that holds timestamped backups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_root: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            asdf_version: "v0.14.1".to_string(),
            node_version: "lts".to_string(),
            nerd_font_version: "v3.1.1".to_string(),
            carapace_fallback_version: "v1.0.6".to_string(),
            connectivity_url: "https://google.com".to_string(),
            backup_root: None,
        }
    }
}

impl AppConfig {
    pub fn config_path(home: &Path) -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.trim().is_empty() {
                return crate::utils::expand_path(&path);
            }
        }
        home.join(".config").join("better-terminal").join("config.yaml")
    }

    /// Load settings for the given home directory, falling back to defaults
    /// when no config file exists.
    pub fn load(home: &Path) -> Result<Self> {
        Self::load_from(&Self::config_path(home))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| BtError::fs(path, e))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .map_err(|e| BtError::Config(format!("Invalid config {}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("asdf_version", &self.asdf_version),
            ("nerd_font_version", &self.nerd_font_version),
            ("carapace_fallback_version", &self.carapace_fallback_version),
        ] {
            if !is_release_tag(value) {
                return Err(BtError::Config(format!(
                    "Invalid {} '{}'. Use a release tag like 'v1.2.3'",
                    field, value
                )));
            }
        }

        if self.node_version.trim().is_empty() || self.node_version.contains(char::is_whitespace) {
            return Err(BtError::Config(format!(
                "Invalid node_version '{}'",
                self.node_version
            )));
        }

        if !(self.connectivity_url.starts_with("http://")
            || self.connectivity_url.starts_with("https://"))
        {
            return Err(BtError::Config(format!(
                "Invalid connectivity_url '{}'. Must start with http:// or https://",
                self.connectivity_url
            )));
        }

        Ok(())
    }

    /// Backup root with `~` expanded, if one was configured.
    pub fn backup_root(&self) -> Option<PathBuf> {
        self.backup_root
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(crate::utils::expand_path)
    }
}

fn is_release_tag(s: &str) -> bool {
    s.strip_prefix('v')
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.'))
        .unwrap_or(false)
}
