use std::sync::Arc;

use console::style;

use crate::backup::BackupManager;
use crate::config::AppConfig;
use crate::error::Result;
use crate::host::{Host, SystemHost};
use crate::installers::{InstallContext, Outcome};
use crate::lock;
use crate::pipeline::{standard_phases, ConfirmGate, InstallOptions, Orchestrator, PipelineReport};
use crate::platform::PlatformProfile;
use crate::ui;
use crate::utils::format_duration;
use crate::writer::ConfigWriter;

pub async fn execute(
    profile: PlatformProfile,
    config: AppConfig,
    options: InstallOptions,
) -> Result<bool> {
    ui::print_banner();
    ui::header("Better Terminal Installation");

    if options.dry_run {
        ui::warn("DRY RUN MODE - no changes will be made");
    }

    if profile.elevated {
        match &profile.invoking_user {
            Some(user) => ui::info(&format!("Installing for user: {}", user)),
            None => {
                ui::warn(&format!(
                    "Running as root. Config files will be installed to {}",
                    profile.home_dir.display()
                ));
                ui::info("To install for a specific user, run: sudo -u <user> better-terminal install");
            }
        }
    }

    ui::info(&format!("Platform: {} ({})", profile.os, profile.arch));
    ui::info(&format!("Package manager: {}", profile.package_manager));
    ui::info(&format!("Home: {}", profile.home_dir.display()));

    let _lock = if options.dry_run {
        None
    } else {
        profile.ensure_supported()?;
        Some(lock::acquire(&profile.home_dir)?)
    };

    let backups = super::backup_manager(&profile, &config);
    let backup_root = backups.root().to_path_buf();
    let writer = ConfigWriter::new(&profile.home_dir).with_owner(profile.owner);
    let targets = writer.targets();
    let phases = standard_phases(&options, backups, writer);

    let host: Arc<dyn Host> = Arc::new(SystemHost::new()?);
    let ctx = InstallContext::new(profile, host, config);

    let mut orchestrator = Orchestrator::new().dry_run(options.dry_run);
    if options.interactive && !options.dry_run {
        orchestrator = orchestrator.with_gate(ConfirmGate);
    }

    let report = orchestrator.run(phases, &ctx).await?;

    if report.dry_run {
        println!();
        ui::info("Configuration files that would be replaced:");
        for target in &targets {
            ui::dim(&format!("  {}", target.display()));
        }
        println!();
        ui::info("Run without --dry-run to perform installation");
        return Ok(true);
    }

    print_summary(&report);

    if report.succeeded() {
        print_next_steps();
    } else {
        let latest = BackupManager::new(&ctx.profile.home_dir)
            .with_root(backup_root)
            .latest()
            .ok()
            .flatten();
        if let Some(dir) = latest {
            ui::info(&format!(
                "Your previous configuration is saved in {}",
                dir.display()
            ));
            ui::info(&format!("Restore it with: better-terminal restore {}", dir.display()));
        }
    }

    Ok(report.succeeded())
}

fn print_summary(report: &PipelineReport) {
    ui::header("Summary");

    for record in &report.records {
        let line = match &record.outcome {
            Outcome::Success => format!("  {} {}", style("✓").green(), record.name),
            Outcome::Skipped(reason) => format!(
                "  {} {} {}",
                style("-").dim(),
                style(&record.name).dim(),
                style(format!("({})", reason)).dim()
            ),
            Outcome::Failure(reason) => format!(
                "  {} {} {}",
                style("✕").red(),
                record.name,
                style(format!("({})", reason)).dim()
            ),
        };
        println!("{}", line);
    }

    println!();
    match &report.aborted_at {
        None => {
            ui::success(&format!(
                "Installation complete in {}",
                format_duration(report.elapsed.as_secs())
            ));
            let failed = report.failures().count();
            if failed > 0 {
                ui::warn(&format!(
                    "{} optional step(s) failed; rerun `better-terminal install` to retry",
                    failed
                ));
            }
        }
        Some(phase) => ui::error(&format!("Installation aborted at: {}", phase)),
    }
}

fn print_next_steps() {
    println!();
    println!("  {}", style("Next steps").bold());
    ui::dim("1. Restart your terminal or run: exec zsh");
    ui::dim("2. Set your terminal font to \"FiraCode Nerd Font\"");
    ui::dim("3. Inside tmux, press prefix + I to install plugins");
}
