//! Platform detection.
//!
//! Everything here is resolved once at startup into a [`PlatformProfile`]
//! and then read by the installers; nothing re-probes the environment.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{BtError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Macos,
    Linux,
    Windows,
    Unknown,
}

impl Os {
    pub fn from_target(os: &str) -> Self {
        match os {
            "macos" => Os::Macos,
            "linux" => Os::Linux,
            "windows" => Os::Windows,
            _ => Os::Unknown,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Os::Macos => write!(f, "macos"),
            Os::Linux => write!(f, "linux"),
            Os::Windows => write!(f, "windows"),
            Os::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X64,
    Arm64,
    Unknown,
}

impl Arch {
    pub fn from_target(arch: &str) -> Self {
        match arch {
            "x86_64" => Arch::X64,
            "aarch64" => Arch::Arm64,
            _ => Arch::Unknown,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::X64 => write!(f, "x64"),
            Arch::Arm64 => write!(f, "arm64"),
            Arch::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Brew,
    Apt,
    Dnf,
    Pacman,
    Unknown,
}

impl PackageManager {
    /// Pick the package manager for `os`. On Linux the first of apt-get, dnf
    /// and pacman found on the PATH wins.
    pub fn detect(os: Os, has_command: impl Fn(&str) -> bool) -> Self {
        match os {
            Os::Macos => PackageManager::Brew,
            Os::Linux => {
                if has_command("apt-get") {
                    PackageManager::Apt
                } else if has_command("dnf") {
                    PackageManager::Dnf
                } else if has_command("pacman") {
                    PackageManager::Pacman
                } else {
                    PackageManager::Unknown
                }
            }
            _ => PackageManager::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PackageManager::Brew => "brew",
            PackageManager::Apt => "apt",
            PackageManager::Dnf => "dnf",
            PackageManager::Pacman => "pacman",
            PackageManager::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// uid/gid of the user files are written for when running under sudo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

impl Owner {
    /// chown `path` to this owner.
    #[cfg(unix)]
    pub fn apply(&self, path: &Path) -> Result<()> {
        use nix::unistd::{chown, Gid, Uid};

        chown(
            path,
            Some(Uid::from_raw(self.uid)),
            Some(Gid::from_raw(self.gid)),
        )
        .map_err(|e| BtError::fs(path, std::io::Error::from(e)))
    }

    #[cfg(not(unix))]
    pub fn apply(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Hand `path` and every directory between it and `root` over to `owner`.
///
/// Used after creating files below a user's home while running as root, so
/// freshly created parent directories do not stay root-owned.
pub fn hand_over(owner: Option<Owner>, root: &Path, path: &Path) -> Result<()> {
    let Some(owner) = owner else {
        return Ok(());
    };

    let mut current = Some(path);
    while let Some(p) = current {
        if p == root || !p.starts_with(root) {
            break;
        }
        owner.apply(p)?;
        current = p.parent();
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformProfile {
    pub os: Os,
    pub arch: Arch,
    pub package_manager: PackageManager,
    pub home_dir: PathBuf,
    pub shell: String,
    /// User named by `SUDO_USER`, when invoked through sudo
    pub invoking_user: Option<String>,
    /// Set only when running as root on behalf of another user
    pub owner: Option<Owner>,
    /// Effective uid is 0
    pub elevated: bool,
}

struct UserEntry {
    home: PathBuf,
    owner: Owner,
}

impl PlatformProfile {
    /// Build a profile with explicit values and no sudo remapping.
    #[cfg(test)]
    pub fn new(os: Os, arch: Arch, package_manager: PackageManager, home_dir: PathBuf) -> Self {
        Self {
            os,
            arch,
            package_manager,
            home_dir,
            shell: "/bin/bash".to_string(),
            invoking_user: None,
            owner: None,
            elevated: false,
        }
    }

    /// Detect the current platform from the process environment.
    pub fn detect() -> Result<Self> {
        let os = Os::from_target(std::env::consts::OS);
        let arch = Arch::from_target(std::env::consts::ARCH);
        let package_manager = PackageManager::detect(os, |cmd| which::which(cmd).is_ok());

        let invoking_user = std::env::var("SUDO_USER")
            .ok()
            .filter(|u| !u.trim().is_empty());
        let entry = invoking_user.as_deref().and_then(lookup_user);

        let home_dir = resolve_home(entry.as_ref().map(|e| e.home.clone()), env_home())
            .ok_or_else(|| {
                BtError::EnvironmentUnsupported(
                    "Cannot determine home directory (HOME and USERPROFILE are unset)".to_string(),
                )
            })?;

        let elevated = is_root();
        let owner = entry.map(|e| e.owner).filter(|o| elevated && o.uid != 0);

        let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string());

        tracing::debug!(
            "Detected platform {} ({}), package manager {}, home {}",
            os,
            arch,
            package_manager,
            home_dir.display()
        );

        Ok(Self {
            os,
            arch,
            package_manager,
            home_dir,
            shell,
            invoking_user,
            owner,
            elevated,
        })
    }

    pub fn is_known(&self) -> bool {
        self.os != Os::Unknown && self.arch != Arch::Unknown
    }

    pub fn ensure_supported(&self) -> Result<()> {
        if self.is_known() {
            Ok(())
        } else {
            Err(BtError::EnvironmentUnsupported(format!(
                "{} ({})",
                self.os, self.arch
            )))
        }
    }

    pub fn is_mac(&self) -> bool {
        self.os == Os::Macos
    }

    pub fn is_linux(&self) -> bool {
        self.os == Os::Linux
    }

    /// `path` relative to the resolved home directory.
    pub fn home(&self, path: impl AsRef<Path>) -> PathBuf {
        self.home_dir.join(path)
    }
}

/// Home directory precedence: the sudo user's passwd entry, then the
/// environment of the current process.
pub fn resolve_home(sudo_home: Option<PathBuf>, env_home: Option<PathBuf>) -> Option<PathBuf> {
    sudo_home.or(env_home)
}

fn env_home() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
}

#[cfg(unix)]
fn lookup_user(name: &str) -> Option<UserEntry> {
    match nix::unistd::User::from_name(name) {
        Ok(Some(user)) => Some(UserEntry {
            home: user.dir,
            owner: Owner {
                uid: user.uid.as_raw(),
                gid: user.gid.as_raw(),
            },
        }),
        Ok(None) => {
            tracing::warn!("SUDO_USER '{}' has no passwd entry", name);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to look up SUDO_USER '{}': {}", name, e);
            None
        }
    }
}

#[cfg(not(unix))]
fn lookup_user(_name: &str) -> Option<UserEntry> {
    None
}

#[cfg(unix)]
pub fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}
