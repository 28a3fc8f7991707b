use async_trait::async_trait;

use super::{already_installed, InstallContext, Installer, Outcome};
use crate::error::Result;
use crate::host::CommandSpec;

const INSTALL_SCRIPT_URL: &str =
    "https://raw.githubusercontent.com/ohmyzsh/ohmyzsh/master/tools/install.sh";

pub struct OhMyZshInstaller;

#[async_trait]
impl Installer for OhMyZshInstaller {
    fn name(&self) -> &str {
        "oh-my-zsh"
    }

    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome> {
        let dir = ctx.home(".oh-my-zsh");
        if ctx.host.path_exists(&dir.join("oh-my-zsh.sh")) {
            return already_installed("Oh My Zsh");
        }

        let script = std::env::temp_dir().join("better-terminal-install-ohmyzsh.sh");
        ctx.host.download(INSTALL_SCRIPT_URL, &script).await?;

        // .zshrc belongs to the config writer; the login shell is a later phase.
        let env = ctx
            .exec_context()
            .with_env("RUNZSH", "no")
            .with_env("CHSH", "no")
            .with_env("KEEP_ZSHRC", "yes")
            .with_env("ZSH", dir.display().to_string());

        let ran = ctx
            .host
            .run(
                &CommandSpec::new(
                    "sh",
                    [script.display().to_string(), "--unattended".to_string()],
                )
                .context(env),
            )
            .await;
        ctx.host.remove_path(&script).await;
        ran?;

        ctx.hand_over_tree(&dir).await?;
        Ok(Outcome::Success)
    }
}
