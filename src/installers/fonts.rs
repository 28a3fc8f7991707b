use async_trait::async_trait;

use super::{already_installed, install_package, InstallContext, Installer, Outcome};
use crate::error::Result;
use crate::host::CommandSpec;
use crate::platform::PackageManager;
use crate::ui;

const CASK: &str = "font-fira-code-nerd-font";

/// FiraCode Nerd Font: a Homebrew cask on macOS, the release zip unpacked
/// into `~/.local/share/fonts` on Linux.
pub struct FontInstaller;

#[async_trait]
impl Installer for FontInstaller {
    fn name(&self) -> &str {
        "FiraCode Nerd Font"
    }

    async fn attempt(&self, ctx: &InstallContext) -> Result<Outcome> {
        if ctx.profile.is_mac() {
            install_mac(ctx).await
        } else if ctx.profile.is_linux() {
            install_linux(ctx).await
        } else {
            ui::warn("Font installation not supported on this platform");
            Ok(Outcome::skipped(format!("unsupported on {}", ctx.profile.os)))
        }
    }
}

async fn install_mac(ctx: &InstallContext) -> Result<Outcome> {
    let listed = ctx
        .host
        .run(&ctx.brew(&["list", "--cask", CASK]).silent().ignore_error())
        .await?;
    if listed.success() {
        return already_installed("FiraCode Nerd Font");
    }

    ctx.host
        .run(&ctx.brew(&["tap", "homebrew/cask-fonts"]).ignore_error())
        .await?;
    ctx.host.run(&ctx.brew(&["install", "--cask", CASK])).await?;
    Ok(Outcome::Success)
}

async fn install_linux(ctx: &InstallContext) -> Result<Outcome> {
    let font_dir = ctx.home(".local/share/fonts/FiraCode");
    if ctx
        .host
        .path_exists(&font_dir.join("FiraCodeNerdFont-Regular.ttf"))
    {
        return already_installed("FiraCode Nerd Font");
    }

    if !ctx.host.command_exists("unzip") {
        if ctx.profile.package_manager == PackageManager::Unknown {
            return Ok(Outcome::failure("unzip is required to unpack the font archive"));
        }
        install_package(ctx, "unzip").await?;
    }

    // fc-cache comes with fontconfig; fonts still work without a cache refresh.
    if !ctx.host.command_exists("fc-cache") {
        if let Err(e) = install_package(ctx, "fontconfig").await {
            tracing::debug!("fontconfig install failed: {}", e);
        }
    }

    let url = format!(
        "https://github.com/ryanoasis/nerd-fonts/releases/download/{}/FiraCode.zip",
        ctx.config.nerd_font_version
    );
    let archive = std::env::temp_dir().join("better-terminal-FiraCode.zip");
    ctx.host.download(&url, &archive).await?;

    let unpacked: Result<()> = async {
        ctx.host.create_dir_all(&font_dir).await?;
        ctx.host
            .run(
                &CommandSpec::new(
                    "unzip",
                    [
                        "-o".to_string(),
                        "-q".to_string(),
                        archive.display().to_string(),
                        "-d".to_string(),
                        font_dir.display().to_string(),
                    ],
                )
                .silent(),
            )
            .await?;
        Ok(())
    }
    .await;
    ctx.host.remove_path(&archive).await;
    unpacked?;
    ctx.hand_over_tree(&font_dir).await?;

    ui::info("Updating font cache...");
    ctx.host
        .run(&CommandSpec::new("fc-cache", ["-f"]).silent().ignore_error())
        .await?;

    Ok(Outcome::Success)
}
