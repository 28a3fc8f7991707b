use std::sync::Arc;

use crate::checker::{CheckReport, CheckStatus, RequirementChecker};
use crate::config::AppConfig;
use crate::error::Result;
use crate::host::SystemHost;
use crate::platform::PlatformProfile;
use crate::ui;

pub async fn execute(profile: PlatformProfile, config: AppConfig) -> Result<bool> {
    ui::header("System Requirements Check");

    let host = Arc::new(SystemHost::new()?);
    let report = {
        let _spinner = ui::spinner("Checking requirements...");
        RequirementChecker::new(profile, host, config).run().await
    };

    print_report(&report);
    Ok(report.ready())
}

fn print_report(report: &CheckReport) {
    for item in &report.requirements {
        let line = format!("{}: {}", item.label, item.detail);
        match item.status {
            CheckStatus::Ok => ui::success(&line),
            CheckStatus::Warn => ui::warn(&line),
            CheckStatus::Fail => ui::error(&line),
        }
    }

    ui::header("Existing Installations");
    for tool in &report.tools {
        if tool.installed {
            ui::info(&format!(
                "{}: {}",
                tool.name,
                tool.version.as_deref().unwrap_or("installed")
            ));
        } else {
            ui::dim(&format!("{}: not installed", tool.name));
        }
    }

    println!();
    if report.ready() {
        ui::success("System is ready for installation!");
    } else {
        ui::error("Some requirements are not met");
    }
}
