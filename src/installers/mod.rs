//! Per-tool installers.
//!
//! Every installer probes before it mutates: when the tool is already present
//! `attempt` returns [`Outcome::Success`] without touching the machine.

mod antigen;
mod asdf;
mod carapace;
mod eza;
mod fonts;
mod fzf;
mod oh_my_zsh;
mod shell;
mod tmux;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::Result;
use crate::host::{CommandSpec, ExecutionContext, Host};
use crate::platform::{self, PackageManager, PlatformProfile};
use crate::ui;

pub use antigen::AntigenInstaller;
pub use asdf::{AsdfInstaller, NodeInstaller};
pub use carapace::CarapaceInstaller;
pub use eza::EzaInstaller;
pub use fonts::FontInstaller;
pub use fzf::FzfInstaller;
pub use oh_my_zsh::OhMyZshInstaller;
pub use shell::{DefaultShellInstaller, ZshInstaller};
pub use tmux::{TmuxInstaller, TpmInstaller};

/// Where standalone release binaries are installed.
const BIN_DIR: &str = "/usr/local/bin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
    Skipped(String),
}

impl Outcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        Outcome::Failure(reason.into())
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Outcome::Skipped(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "ok"),
            Outcome::Failure(reason) => write!(f, "failed: {}", reason),
            Outcome::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

/// Everything an installer may look at or act through.
#[derive(Clone)]
pub struct InstallContext {
    pub profile: PlatformProfile,
    pub host: Arc<dyn Host>,
    pub config: AppConfig,
}

impl InstallContext {
    pub fn new(profile: PlatformProfile, host: Arc<dyn Host>, config: AppConfig) -> Self {
        Self {
            profile,
            host,
            config,
        }
    }

    pub fn home(&self, path: impl AsRef<Path>) -> PathBuf {
        self.profile.home(path)
    }

    /// Base context for user-level commands: `HOME` points at the resolved
    /// home even when running under sudo.
    pub fn exec_context(&self) -> ExecutionContext {
        ExecutionContext::new().with_env("HOME", self.profile.home_dir.display().to_string())
    }

    /// Wrap a system-level command with `sudo` unless already root.
    pub fn privileged(&self, spec: CommandSpec) -> CommandSpec {
        if self.profile.elevated || self.profile.is_mac() || !self.host.command_exists("sudo") {
            return spec;
        }
        let mut args = vec![spec.program.clone()];
        args.extend(spec.args.iter().cloned());
        CommandSpec {
            program: "sudo".to_string(),
            args,
            interactive: true,
            ..spec
        }
    }

    /// brew refuses to run as root, so under sudo it runs as the invoking user.
    fn brew(&self, args: &[&str]) -> CommandSpec {
        match (&self.profile.invoking_user, self.profile.elevated) {
            (Some(user), true) => {
                let mut full = vec!["-u", user.as_str(), "brew"];
                full.extend_from_slice(args);
                CommandSpec::new("sudo", full)
            }
            _ => CommandSpec::new("brew", args.iter().copied()),
        }
    }

    /// Give a tree created under home back to the sudo user, parents included.
    pub async fn hand_over_tree(&self, path: &Path) -> Result<()> {
        let Some(owner) = self.profile.owner else {
            return Ok(());
        };

        self.host
            .run(
                &CommandSpec::new(
                    "chown",
                    [
                        "-R".to_string(),
                        format!("{}:{}", owner.uid, owner.gid),
                        path.display().to_string(),
                    ],
                )
                .silent(),
            )
            .await?;

        if let Some(parent) = path.parent() {
            platform::hand_over(Some(owner), &self.profile.home_dir, parent)?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait Installer: Send + Sync {
    /// Human-readable name used in progress output and reports.
    fn name(&self) -> &str;

    /// Ensure the tool is present. Returns `Success` without side effects
    /// when it already is.
    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome>;
}

pub(crate) fn already_installed(tool: &str) -> Result<Outcome> {
    ui::info(&format!("{} is already installed", tool));
    Ok(Outcome::Success)
}

/// Install `package` with the detected package manager.
pub(crate) async fn install_package(ctx: &InstallContext, package: &str) -> Result<Outcome> {
    match ctx.profile.package_manager {
        PackageManager::Brew => {
            ctx.host.run(&ctx.brew(&["install", package])).await?;
        }
        PackageManager::Apt => {
            ctx.host
                .run(
                    &ctx.privileged(CommandSpec::new("apt-get", ["update"]))
                        .silent()
                        .ignore_error(),
                )
                .await?;
            ctx.host
                .run(&ctx.privileged(CommandSpec::new("apt-get", ["install", "-y", package])))
                .await?;
        }
        PackageManager::Dnf => {
            ctx.host
                .run(&ctx.privileged(CommandSpec::new("dnf", ["install", "-y", package])))
                .await?;
        }
        PackageManager::Pacman => {
            ctx.host
                .run(&ctx.privileged(CommandSpec::new(
                    "pacman",
                    ["-S", "--noconfirm", package],
                )))
                .await?;
        }
        PackageManager::Unknown => {
            return Ok(Outcome::failure(format!(
                "no supported package manager to install {}",
                package
            )));
        }
    }
    Ok(Outcome::Success)
}

/// Download a release tarball and install `binary` from its root into
/// `/usr/local/bin`.
pub(crate) async fn install_release_binary(
    ctx: &InstallContext,
    url: &str,
    binary: &str,
) -> Result<Outcome> {
    let work_dir = std::env::temp_dir().join(format!("better-terminal-{}", binary));
    let archive = work_dir.join(format!("{}.tar.gz", binary));

    ctx.host.create_dir_all(&work_dir).await?;
    let installed = unpack_and_install(ctx, url, &archive, &work_dir, binary).await;
    ctx.host.remove_path(&work_dir).await;
    installed?;

    Ok(Outcome::Success)
}

async fn unpack_and_install(
    ctx: &InstallContext,
    url: &str,
    archive: &Path,
    work_dir: &Path,
    binary: &str,
) -> Result<()> {
    ctx.host.download(url, archive).await?;

    ctx.host
        .run(&CommandSpec::new(
            "tar",
            [
                "xzf".to_string(),
                archive.display().to_string(),
                "-C".to_string(),
                work_dir.display().to_string(),
            ],
        ))
        .await?;

    let target = Path::new(BIN_DIR).join(binary);
    ctx.host
        .run(&ctx.privileged(CommandSpec::new(
            "install",
            [
                "-m".to_string(),
                "755".to_string(),
                work_dir.join(binary).display().to_string(),
                target.display().to_string(),
            ],
        )))
        .await?;

    Ok(())
}

#[derive(Deserialize)]
struct Release {
    tag_name: String,
}

/// Tag of the latest GitHub release of `repo` (`owner/name`), if the API
/// answers.
pub(crate) async fn latest_release_tag(ctx: &InstallContext, repo: &str) -> Option<String> {
    let url = format!("https://api.github.com/repos/{}/releases/latest", repo);
    let body = match ctx.host.fetch_text(&url).await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!("Could not query {}: {}", url, e);
            return None;
        }
    };

    match serde_json::from_str::<Release>(&body) {
        Ok(release) => Some(release.tag_name),
        Err(e) => {
            tracing::debug!("Unexpected release payload from {}: {}", url, e);
            None
        }
    }
}
