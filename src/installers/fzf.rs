use async_trait::async_trait;

use super::{already_installed, InstallContext, Installer, Outcome};
use crate::error::{BtError, Result};
use crate::host::CommandSpec;

const FZF_REPO: &str = "https://github.com/junegunn/fzf.git";

pub struct FzfInstaller;

#[async_trait]
impl Installer for FzfInstaller {
    fn name(&self) -> &str {
        "fzf"
    }

    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome> {
        if ctx.host.command_exists("fzf") {
            return already_installed("fzf");
        }

        if ctx.profile.is_mac() {
            ctx.host.run(&ctx.brew(&["install", "fzf"])).await?;
            // Key bindings and completion for zsh only.
            ctx.host
                .run(
                    &CommandSpec::shell("$(brew --prefix)/opt/fzf/install --all --no-bash --no-fish")
                        .context(ctx.exec_context())
                        .ignore_error(),
                )
                .await?;
            return Ok(Outcome::Success);
        }

        if !ctx.profile.is_linux() {
            return Ok(Outcome::failure(format!(
                "fzf cannot be installed on {}",
                ctx.profile.os
            )));
        }

        let dir = ctx.home(".fzf");
        if ctx.host.path_exists(&dir.join("bin").join("fzf")) {
            return already_installed("fzf");
        }

        if !ctx.host.command_exists("git") {
            return Err(BtError::DependencyMissing(
                "git is required to install fzf".to_string(),
            ));
        }

        ctx.host
            .run(&CommandSpec::new(
                "git",
                [
                    "clone".to_string(),
                    "--depth".to_string(),
                    "1".to_string(),
                    FZF_REPO.to_string(),
                    dir.display().to_string(),
                ],
            ))
            .await?;

        ctx.host
            .run(
                &CommandSpec::new(
                    dir.join("install").display().to_string(),
                    ["--all", "--no-bash", "--no-fish"],
                )
                .context(ctx.exec_context().in_dir(&dir)),
            )
            .await?;

        ctx.hand_over_tree(&dir).await?;
        Ok(Outcome::Success)
    }
}
