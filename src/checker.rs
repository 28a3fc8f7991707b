//! Read-only diagnostics for `better-terminal check`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sysinfo::Disks;

use crate::config::AppConfig;
use crate::host::{CommandSpec, Host};
use crate::platform::{PackageManager, PlatformProfile};
use crate::utils::{first_line, format_bytes};

/// Bound on the connectivity probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Tools listed under "Existing installations", probed on the PATH.
const TOOLS: [&str; 7] = ["zsh", "tmux", "fzf", "eza", "carapace", "node", "npm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckItem {
    pub label: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckItem {
    fn new(label: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            label,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolStatus {
    pub name: &'static str,
    pub installed: bool,
    /// First line of the tool's version output
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub platform_known: bool,
    pub network_ok: bool,
    pub git_present: bool,
    pub requirements: Vec<CheckItem>,
    pub tools: Vec<ToolStatus>,
}

impl CheckReport {
    pub fn ready(&self) -> bool {
        self.platform_known && self.network_ok && self.git_present
    }
}

pub struct RequirementChecker {
    profile: PlatformProfile,
    host: Arc<dyn Host>,
    config: AppConfig,
}

impl RequirementChecker {
    pub fn new(profile: PlatformProfile, host: Arc<dyn Host>, config: AppConfig) -> Self {
        Self {
            profile,
            host,
            config,
        }
    }

    pub async fn run(&self) -> CheckReport {
        let mut requirements = Vec::new();

        let platform_known = self.profile.is_known();
        requirements.push(if platform_known {
            CheckItem::new(
                "Platform",
                CheckStatus::Ok,
                format!("{} ({})", self.profile.os, self.profile.arch),
            )
        } else {
            CheckItem::new(
                "Platform",
                CheckStatus::Fail,
                format!("unsupported: {} ({})", self.profile.os, self.profile.arch),
            )
        });

        let network_ok = self
            .host
            .reachable(&self.config.connectivity_url, PROBE_TIMEOUT)
            .await;
        requirements.push(if network_ok {
            CheckItem::new("Internet", CheckStatus::Ok, "connection available")
        } else {
            CheckItem::new(
                "Internet",
                CheckStatus::Fail,
                format!("{} is not reachable", self.config.connectivity_url),
            )
        });

        let git_present = self.host.command_exists("git");
        requirements.push(if git_present {
            let version = self.version_of("git", "--version").await;
            CheckItem::new(
                "git",
                CheckStatus::Ok,
                version.unwrap_or_else(|| "installed".to_string()),
            )
        } else {
            CheckItem::new("git", CheckStatus::Fail, "not found (required for installation)")
        });

        requirements.push(if self.host.command_exists("curl") {
            CheckItem::new("curl", CheckStatus::Ok, "available")
        } else {
            CheckItem::new("curl", CheckStatus::Warn, "not found (recommended)")
        });

        requirements.push(match self.profile.package_manager {
            PackageManager::Unknown => {
                CheckItem::new("Package manager", CheckStatus::Warn, "no known package manager found")
            }
            pm => CheckItem::new("Package manager", CheckStatus::Ok, pm.name()),
        });

        requirements.push(match disk_available(&self.profile.home_dir) {
            Some(bytes) => CheckItem::new(
                "Disk space",
                CheckStatus::Ok,
                format!("{} available", format_bytes(bytes)),
            ),
            None => CheckItem::new("Disk space", CheckStatus::Warn, "could not be determined"),
        });

        let mut tools = Vec::with_capacity(TOOLS.len() + 3);
        for name in TOOLS {
            if self.host.command_exists(name) {
                let flag = if name == "tmux" { "-V" } else { "--version" };
                tools.push(ToolStatus {
                    name,
                    installed: true,
                    version: self.version_of(name, flag).await,
                });
            } else {
                tools.push(ToolStatus {
                    name,
                    installed: false,
                    version: None,
                });
            }
        }

        for (name, marker) in [
            ("oh-my-zsh", ".oh-my-zsh/oh-my-zsh.sh"),
            ("antigen", "antigen.zsh"),
            ("asdf", ".asdf/asdf.sh"),
        ] {
            tools.push(ToolStatus {
                name,
                installed: self.host.path_exists(&self.profile.home(marker)),
                version: None,
            });
        }

        CheckReport {
            platform_known,
            network_ok,
            git_present,
            requirements,
            tools,
        }
    }

    async fn version_of(&self, tool: &str, flag: &str) -> Option<String> {
        let output = self
            .host
            .run(&CommandSpec::new(tool, [flag]).silent().ignore_error())
            .await
            .ok()?;
        first_line(&output.stdout)
            .or_else(|| first_line(&output.stderr))
            .map(str::to_string)
    }
}

/// Free space on the volume holding `path`, picked by longest mount point
/// prefix.
fn disk_available(path: &Path) -> Option<u64> {
    let disks = Disks::new_with_refreshed_list();
    let mounts: Vec<(PathBuf, u64)> = disks
        .iter()
        .map(|d| (d.mount_point().to_path_buf(), d.available_space()))
        .collect();
    available_for(path, &mounts)
}

fn available_for(path: &Path, mounts: &[(PathBuf, u64)]) -> Option<u64> {
    mounts
        .iter()
        .filter(|(mount, _)| path.starts_with(mount))
        .max_by_key(|(mount, _)| mount.components().count())
        .map(|(_, available)| *available)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use crate::platform::{Arch, Os};

    fn checker(host: FakeHost, os: Os) -> RequirementChecker {
        let profile = PlatformProfile::new(os, Arch::X64, PackageManager::Apt, "/home/u".into());
        RequirementChecker::new(profile, Arc::new(host), AppConfig::default())
    }

    #[tokio::test]
    async fn test_ready_when_requirements_met() {
        let host = FakeHost::new()
            .with_command("git")
            .reachable_network()
            .probe("git --version", 0, "git version 2.43.0\n");

        let report = checker(host, Os::Linux).run().await;

        assert!(report.ready());
        let git = report.requirements.iter().find(|i| i.label == "git").unwrap();
        assert_eq!(git.detail, "git version 2.43.0");
    }

    #[tokio::test]
    async fn test_not_ready_without_git() {
        let report = checker(FakeHost::new().reachable_network(), Os::Linux).run().await;
        assert!(!report.git_present);
        assert!(!report.ready());
    }

    #[tokio::test]
    async fn test_not_ready_offline() {
        let report = checker(FakeHost::new().with_command("git"), Os::Linux).run().await;
        assert!(!report.network_ok);
        assert!(!report.ready());
    }

    #[tokio::test]
    async fn test_not_ready_on_unknown_platform() {
        let host = FakeHost::new().with_command("git").reachable_network();
        let report = checker(host, Os::Unknown).run().await;
        assert!(!report.ready());
        assert_eq!(report.requirements[0].status, CheckStatus::Fail);
    }

    #[tokio::test]
    async fn test_missing_curl_is_only_a_warning() {
        let host = FakeHost::new().with_command("git").reachable_network();
        let report = checker(host, Os::Linux).run().await;

        let curl = report.requirements.iter().find(|i| i.label == "curl").unwrap();
        assert_eq!(curl.status, CheckStatus::Warn);
        assert!(report.ready());
    }

    #[tokio::test]
    async fn test_lists_tools_and_markers() {
        let host = FakeHost::new()
            .with_command("tmux")
            .with_path("/home/u/antigen.zsh")
            .probe("tmux -V", 0, "tmux 3.4\n");
        let host = Arc::new(host);
        let profile =
            PlatformProfile::new(Os::Linux, Arch::X64, PackageManager::Apt, "/home/u".into());
        let report = RequirementChecker::new(profile, host.clone(), AppConfig::default())
            .run()
            .await;

        let tmux = report.tools.iter().find(|t| t.name == "tmux").unwrap();
        assert!(tmux.installed);
        assert_eq!(tmux.version.as_deref(), Some("tmux 3.4"));

        let antigen = report.tools.iter().find(|t| t.name == "antigen").unwrap();
        assert!(antigen.installed);
        assert!(!report.tools.iter().find(|t| t.name == "zsh").unwrap().installed);
        assert_eq!(report.tools.len(), 10);

        assert!(host.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_probes_configured_url() {
        let host = Arc::new(FakeHost::new());
        let profile =
            PlatformProfile::new(Os::Linux, Arch::X64, PackageManager::Apt, "/home/u".into());
        let config = AppConfig {
            connectivity_url: "https://example.org".to_string(),
            ..Default::default()
        };

        RequirementChecker::new(profile, host.clone(), config).run().await;
        assert!(host
            .calls()
            .contains(&crate::host::fake::Call::Reachable("https://example.org".to_string())));
    }

    #[test]
    fn test_available_for_longest_mount() {
        let mounts = vec![
            (PathBuf::from("/"), 10),
            (PathBuf::from("/home"), 20),
            (PathBuf::from("/home/u/data"), 30),
        ];
        assert_eq!(available_for(Path::new("/home/u"), &mounts), Some(20));
        assert_eq!(available_for(Path::new("/var"), &mounts), Some(10));
        assert_eq!(available_for(Path::new("/var"), &[]), None);
    }
}
