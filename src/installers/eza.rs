use async_trait::async_trait;

use super::{already_installed, install_package, install_release_binary, InstallContext, Installer, Outcome};
use crate::error::Result;
use crate::host::CommandSpec;
use crate::platform::{Arch, PackageManager};
use crate::ui;

pub struct EzaInstaller;

fn release_url(arch: Arch) -> String {
    let target = match arch {
        Arch::Arm64 => "aarch64",
        _ => "x86_64",
    };
    format!(
        "https://github.com/eza-community/eza/releases/latest/download/eza_{}-unknown-linux-gnu.tar.gz",
        target
    )
}

#[async_trait]
impl Installer for EzaInstaller {
    fn name(&self) -> &str {
        "eza"
    }

    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome> {
        if ctx.host.command_exists("eza") {
            return already_installed("eza");
        }

        match ctx.profile.package_manager {
            // Older Debian and Ubuntu releases do not package eza.
            PackageManager::Apt => {
                ctx.host
                    .run(
                        &ctx.privileged(CommandSpec::new("apt-get", ["update"]))
                            .silent()
                            .ignore_error(),
                    )
                    .await?;
                let output = ctx
                    .host
                    .run(
                        &ctx.privileged(CommandSpec::new("apt-get", ["install", "-y", "eza"]))
                            .ignore_error(),
                    )
                    .await?;
                if output.success() {
                    return Ok(Outcome::Success);
                }

                ui::info("eza not in apt, installing the release binary...");
                install_release_binary(ctx, &release_url(ctx.profile.arch), "eza").await
            }
            _ => install_package(ctx, "eza").await,
        }
    }
}
