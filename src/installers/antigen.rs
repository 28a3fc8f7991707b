use async_trait::async_trait;

use super::{already_installed, InstallContext, Installer, Outcome};
use crate::error::Result;
use crate::platform;

const ANTIGEN_URL: &str = "https://raw.githubusercontent.com/zsh-users/antigen/master/bin/antigen.zsh";

/// Antigen is a single script sourced from `~/antigen.zsh`.
pub struct AntigenInstaller;

#[async_trait]
impl Installer for AntigenInstaller {
    fn name(&self) -> &str {
        "Antigen"
    }

    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome> {
        let target = ctx.home("antigen.zsh");
        if ctx.host.path_exists(&target) {
            return already_installed("Antigen");
        }

        ctx.host.download(ANTIGEN_URL, &target).await?;
        platform::hand_over(ctx.profile.owner, &ctx.profile.home_dir, &target)?;
        Ok(Outcome::Success)
    }
}
