use std::path::PathBuf;

use async_trait::async_trait;

use super::{already_installed, InstallContext, Installer, Outcome};
use crate::error::{BtError, Result};
use crate::host::{CommandSpec, ExecutionContext};
use crate::ui;

const ASDF_REPO: &str = "https://github.com/asdf-vm/asdf.git";

fn asdf_dir(ctx: &InstallContext) -> PathBuf {
    ctx.home(".asdf")
}

pub struct AsdfInstaller;

#[async_trait]
impl Installer for AsdfInstaller {
    fn name(&self) -> &str {
        "asdf"
    }

    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome> {
        let dir = asdf_dir(ctx);
        if ctx.host.path_exists(&dir.join("asdf.sh")) {
            return already_installed("asdf");
        }

        if !ctx.host.command_exists("git") {
            return Err(BtError::DependencyMissing(
                "git is required to install asdf".to_string(),
            ));
        }

        ctx.host
            .run(&CommandSpec::new(
                "git",
                [
                    "clone".to_string(),
                    ASDF_REPO.to_string(),
                    dir.display().to_string(),
                    "--branch".to_string(),
                    ctx.config.asdf_version.clone(),
                ],
            ))
            .await?;

        ctx.hand_over_tree(&dir).await?;
        Ok(Outcome::Success)
    }
}

/// Node.js installed through the asdf nodejs plugin.
pub struct NodeInstaller;

impl NodeInstaller {
    /// Environment asdf needs when it has not been sourced by a shell.
    fn asdf_env(ctx: &InstallContext) -> ExecutionContext {
        let dir = asdf_dir(ctx);
        ctx.exec_context()
            .prepend_path(&[dir.join("bin"), dir.join("shims")])
            .with_env("ASDF_DIR", dir.display().to_string())
            .with_env("ASDF_DATA_DIR", dir.display().to_string())
    }
}

#[async_trait]
impl Installer for NodeInstaller {
    fn name(&self) -> &str {
        "Node.js"
    }

    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome> {
        let dir = asdf_dir(ctx);
        let asdf = dir.join("bin").join("asdf");
        if !ctx.host.path_exists(&asdf) {
            return Ok(Outcome::failure("asdf is not installed"));
        }

        let asdf = asdf.display().to_string();
        let env = Self::asdf_env(ctx);
        let asdf_cmd = |args: &[&str]| CommandSpec::new(asdf.clone(), args.iter().copied()).context(env.clone());

        if ctx.host.path_exists(&dir.join("shims").join("node")) {
            let current = ctx
                .host
                .run(&asdf_cmd(&["current", "nodejs"]).silent().ignore_error())
                .await?;
            if current.success() {
                return already_installed("Node.js");
            }
        }

        // Fails harmlessly when the plugin is already there.
        ctx.host
            .run(&asdf_cmd(&["plugin", "add", "nodejs"]).ignore_error())
            .await?;

        let version = ctx.config.node_version.as_str();
        ui::info(&format!(
            "Installing Node.js {} (this may take a few minutes)...",
            version
        ));
        ctx.host
            .run(&asdf_cmd(&["install", "nodejs", version]))
            .await?;
        ctx.host
            .run(&asdf_cmd(&["global", "nodejs", version]))
            .await?;

        ctx.hand_over_tree(&dir).await?;
        Ok(Outcome::Success)
    }
}
