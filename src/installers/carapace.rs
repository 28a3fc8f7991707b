use std::path::Path;

use async_trait::async_trait;

use super::{
    already_installed, install_release_binary, latest_release_tag, InstallContext, Installer,
    Outcome,
};
use crate::error::Result;
use crate::host::CommandSpec;
use crate::platform::{Arch, PackageManager};
use crate::ui;

const REPO: &str = "carapace-sh/carapace-bin";
const FURY_LIST: &str = "/etc/apt/sources.list.d/fury.list";
const FURY_SOURCE: &str = "deb [trusted=yes] https://apt.fury.io/rsteube/ /";

pub struct CarapaceInstaller;

/// Release assets are named `carapace-bin_<version>_linux_<arch>.tar.gz`,
/// with the version lacking its `v` prefix.
fn release_url(version: &str, arch: Arch) -> String {
    let arch = match arch {
        Arch::Arm64 => "arm64",
        _ => "amd64",
    };
    let bare = version.trim_start_matches('v');
    format!(
        "https://github.com/{}/releases/download/{}/carapace-bin_{}_linux_{}.tar.gz",
        REPO, version, bare, arch
    )
}

#[async_trait]
impl Installer for CarapaceInstaller {
    fn name(&self) -> &str {
        "carapace"
    }

    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome> {
        if ctx.host.command_exists("carapace") {
            return already_installed("carapace");
        }

        if ctx.profile.is_mac() {
            ctx.host.run(&ctx.brew(&["install", "carapace"])).await?;
            return Ok(Outcome::Success);
        }

        if !ctx.profile.is_linux() {
            return Ok(Outcome::failure(format!(
                "carapace cannot be installed on {}",
                ctx.profile.os
            )));
        }

        if ctx.profile.package_manager == PackageManager::Apt && try_fury(ctx).await? {
            return Ok(Outcome::Success);
        }

        ui::info("Downloading carapace from GitHub releases...");
        let version = match latest_release_tag(ctx, REPO).await {
            Some(tag) => tag,
            None => ctx.config.carapace_fallback_version.clone(),
        };
        install_release_binary(ctx, &release_url(&version, ctx.profile.arch), "carapace").await
    }
}

/// Install `carapace-bin` from the fury.io apt repository. `false` means the
/// caller should fall back to the release tarball.
async fn try_fury(ctx: &InstallContext) -> Result<bool> {
    ui::info("Trying to install carapace via apt (fury.io)...");

    if !ctx.host.path_exists(Path::new(FURY_LIST)) {
        let added = ctx
            .host
            .run(
                &ctx.privileged(CommandSpec::shell(format!(
                    "echo '{}' > {}",
                    FURY_SOURCE, FURY_LIST
                )))
                .silent()
                .ignore_error(),
            )
            .await?;
        if !added.success() {
            return Ok(false);
        }
    }

    ctx.host
        .run(
            &ctx.privileged(CommandSpec::new("apt-get", ["update"]))
                .silent()
                .ignore_error(),
        )
        .await?;
    let installed = ctx
        .host
        .run(
            &ctx.privileged(CommandSpec::new("apt-get", ["install", "-y", "carapace-bin"]))
                .silent()
                .ignore_error(),
        )
        .await?;

    Ok(installed.success() && ctx.host.command_exists("carapace"))
}
