use std::path::Path;

use async_trait::async_trait;

use super::{already_installed, install_package, InstallContext, Installer, Outcome};
use crate::error::Result;
use crate::host::CommandSpec;
use crate::ui;

const ETC_SHELLS: &str = "/etc/shells";

pub struct ZshInstaller;

#[async_trait]
impl Installer for ZshInstaller {
    fn name(&self) -> &str {
        "zsh"
    }

    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome> {
        if ctx.host.command_exists("zsh") {
            return already_installed("zsh");
        }

        if !(ctx.profile.is_mac() || ctx.profile.is_linux()) {
            return Ok(Outcome::failure(format!(
                "zsh cannot be installed on {}",
                ctx.profile.os
            )));
        }

        install_package(ctx, "zsh").await
    }
}

/// Make zsh the login shell of the target user.
pub struct DefaultShellInstaller;

#[async_trait]
impl Installer for DefaultShellInstaller {
    fn name(&self) -> &str {
        "Default shell"
    }

    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome> {
        let Some(zsh) = ctx.host.command_path("zsh") else {
            return Ok(Outcome::failure("zsh not found on PATH"));
        };
        let zsh = zsh.display().to_string();

        // Under sudo $SHELL belongs to root, so it says nothing about the target user.
        if ctx.profile.invoking_user.is_none() && ctx.profile.shell == zsh {
            ui::info("zsh is already the default shell");
            return Ok(Outcome::Success);
        }

        let shells = ctx
            .host
            .read_file(Path::new(ETC_SHELLS))
            .await
            .unwrap_or_default();
        if !shells.lines().any(|line| line.trim() == zsh) {
            ui::info(&format!("Adding {} to {}", zsh, ETC_SHELLS));
            ctx.host
                .run(
                    &ctx.privileged(CommandSpec::shell(format!(
                        "echo '{}' >> {}",
                        zsh, ETC_SHELLS
                    )))
                    .silent()
                    .ignore_error(),
                )
                .await?;
        }

        let mut args = vec!["-s".to_string(), zsh];
        if let Some(user) = &ctx.profile.invoking_user {
            args.push(user.clone());
        }

        let output = ctx
            .host
            .run(&CommandSpec::new("chsh", args).interactive().ignore_error())
            .await?;

        if output.success() {
            Ok(Outcome::Success)
        } else {
            ui::warn("Could not set zsh as default shell. You may need to run: chsh -s $(which zsh)");
            Ok(Outcome::failure("chsh failed"))
        }
    }
}
