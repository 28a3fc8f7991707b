use async_trait::async_trait;

use super::{already_installed, install_package, InstallContext, Installer, Outcome};
use crate::error::{BtError, Result};
use crate::host::CommandSpec;
use crate::ui;

const TPM_REPO: &str = "https://github.com/tmux-plugins/tpm";

pub struct TmuxInstaller;

#[async_trait]
impl Installer for TmuxInstaller {
    fn name(&self) -> &str {
        "tmux"
    }

    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome> {
        if ctx.host.command_exists("tmux") {
            return already_installed("tmux");
        }
        install_package(ctx, "tmux").await
    }
}

/// Tmux Plugin Manager, cloned into `~/.tmux/plugins/tpm`.
pub struct TpmInstaller;

#[async_trait]
impl Installer for TpmInstaller {
    fn name(&self) -> &str {
        "TPM"
    }

    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome> {
        let dir = ctx.home(".tmux/plugins/tpm");
        if ctx.host.path_exists(&dir.join("tpm")) {
            return already_installed("TPM");
        }

        if !ctx.host.command_exists("git") {
            return Err(BtError::DependencyMissing(
                "git is required to install TPM".to_string(),
            ));
        }

        ctx.host
            .run(&CommandSpec::new(
                "git",
                [
                    "clone".to_string(),
                    TPM_REPO.to_string(),
                    dir.display().to_string(),
                ],
            ))
            .await?;

        ctx.hand_over_tree(&ctx.home(".tmux")).await?;
        ui::info("Run \"prefix + I\" in tmux to install plugins");
        Ok(Outcome::Success)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::host::fake::FakeHost;
    use crate::installers::test_support::*;

    #[tokio::test]
    async fn test_tmux_present_is_noop() {
        let host = Arc::new(FakeHost::new().with_command("tmux"));
        let ctx = linux_ctx(host.clone());

        assert_eq!(TmuxInstaller.attempt(&ctx).await.unwrap(), Outcome::Success);
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_tpm_clone() {
        let host = Arc::new(FakeHost::new().with_command("git"));
        let ctx = linux_ctx(host.clone());

        assert_eq!(TpmInstaller.attempt(&ctx).await.unwrap(), Outcome::Success);
        assert_eq!(
            host.runs(),
            vec![format!("git clone {} {}/.tmux/plugins/tpm", TPM_REPO, HOME)]
        );
    }

    #[tokio::test]
    async fn test_tpm_present_is_noop() {
        let host = Arc::new(FakeHost::new().with_path(format!("{}/.tmux/plugins/tpm/tpm", HOME)));
        let ctx = linux_ctx(host.clone());

        assert_eq!(TpmInstaller.attempt(&ctx).await.unwrap(), Outcome::Success);
        assert!(host.mutations().is_empty());
    }
}
