//! The installation pipeline.
//!
//! Phases run strictly in order. A failing Critical phase stops the run; a
//! failing Optional phase is reported and the run continues. Only the
//! [`Orchestrator`] interprets criticality.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dialoguer::Confirm;
use futures::FutureExt;

use crate::backup::BackupManager;
use crate::error::Result;
use crate::installers::{
    AntigenInstaller, AsdfInstaller, CarapaceInstaller, DefaultShellInstaller, EzaInstaller,
    FontInstaller, FzfInstaller, InstallContext, Installer, NodeInstaller, OhMyZshInstaller,
    Outcome, TmuxInstaller, TpmInstaller, ZshInstaller,
};
use crate::ui;
use crate::writer::ConfigWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    Critical,
    Optional,
}

impl std::fmt::Display for Criticality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Criticality::Critical => write!(f, "critical"),
            Criticality::Optional => write!(f, "optional"),
        }
    }
}

pub struct Phase {
    pub name: String,
    pub criticality: Criticality,
    action: Box<dyn Installer>,
    skip_reason: Option<String>,
    on_success: Vec<Phase>,
}

impl Phase {
    fn new(action: impl Installer + 'static, criticality: Criticality) -> Self {
        Self {
            name: action.name().to_string(),
            criticality,
            action: Box::new(action),
            skip_reason: None,
            on_success: Vec::new(),
        }
    }

    pub fn critical(action: impl Installer + 'static) -> Self {
        Self::new(action, Criticality::Critical)
    }

    pub fn optional(action: impl Installer + 'static) -> Self {
        Self::new(action, Criticality::Optional)
    }

    /// Report this phase as Skipped without attempting it when `condition`
    /// holds.
    pub fn skip_if(mut self, condition: bool, reason: impl Into<String>) -> Self {
        if condition {
            self.skip_reason = Some(reason.into());
        }
        self
    }

    /// Run `phase` right after this one, only if this one succeeds.
    pub fn then(mut self, phase: Phase) -> Self {
        self.on_success.push(phase);
        self
    }

    fn count(&self) -> usize {
        1 + self.on_success.iter().map(Phase::count).sum::<usize>()
    }

    fn describe(&self, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        let mut line = format!("{}{} ({})", indent, self.name, self.criticality);
        if let Some(reason) = &self.skip_reason {
            line.push_str(&format!(", skipped: {}", reason));
        }
        lines.push(line);
        for followup in &self.on_success {
            followup.describe(depth + 1, lines);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseRecord {
    pub name: String,
    pub criticality: Criticality,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub records: Vec<PhaseRecord>,
    /// Name of the Critical phase that stopped the run
    pub aborted_at: Option<String>,
    pub dry_run: bool,
    pub elapsed: Duration,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.aborted_at.is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PhaseRecord> {
        self.records.iter().filter(|r| r.outcome.is_failure())
    }

    #[cfg(test)]
    pub fn outcome_of(&self, name: &str) -> Option<&Outcome> {
        self.records
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.outcome)
    }
}

/// Decides whether a phase may run. Used for `--interactive`.
pub trait PhaseGate: Send + Sync {
    fn confirm(&self, name: &str, criticality: Criticality) -> Result<bool>;
}

pub struct AutoApprove;

impl PhaseGate for AutoApprove {
    fn confirm(&self, _name: &str, _criticality: Criticality) -> Result<bool> {
        Ok(true)
    }
}

/// Asks on the terminal before each phase.
pub struct ConfirmGate;

impl PhaseGate for ConfirmGate {
    fn confirm(&self, name: &str, criticality: Criticality) -> Result<bool> {
        let prompt = match criticality {
            Criticality::Critical => format!("Run {}? (required, declining aborts)", name),
            Criticality::Optional => format!("Run {}?", name),
        };
        Ok(Confirm::new().with_prompt(prompt).default(true).interact()?)
    }
}

pub struct Orchestrator {
    dry_run: bool,
    gate: Box<dyn PhaseGate>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            dry_run: false,
            gate: Box::new(AutoApprove),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_gate(mut self, gate: impl PhaseGate + 'static) -> Self {
        self.gate = Box::new(gate);
        self
    }

    /// One line per phase, follow-ups indented under their parent.
    pub fn plan(phases: &[Phase]) -> Vec<String> {
        let mut lines = Vec::new();
        for phase in phases {
            phase.describe(0, &mut lines);
        }
        lines
    }

    pub async fn run(&self, phases: Vec<Phase>, ctx: &InstallContext) -> Result<PipelineReport> {
        let started = Instant::now();

        if self.dry_run {
            ui::header("Dry run: the following steps would be performed");
            for (i, line) in Self::plan(&phases).iter().enumerate() {
                ui::dim(&format!("{:>2}. {}", i + 1, line));
            }
            return Ok(PipelineReport {
                records: Vec::new(),
                aborted_at: None,
                dry_run: true,
                elapsed: started.elapsed(),
            });
        }

        let total: usize = phases.iter().map(Phase::count).sum();
        let mut queue: VecDeque<Phase> = phases.into();
        let mut records = Vec::with_capacity(total);
        let mut aborted_at = None;
        let mut index = 0;

        while let Some(phase) = queue.pop_front() {
            index += 1;
            let Phase {
                name,
                criticality,
                action,
                skip_reason,
                on_success,
            } = phase;

            let outcome = if let Some(reason) = skip_reason {
                ui::info(&format!("Skipping {} ({})", name, reason));
                Outcome::Skipped(reason)
            } else {
                match self.gate.confirm(&name, criticality) {
                    Ok(true) => {
                        ui::step(&format!("[{}/{}] {}", index, total, name));
                        let outcome = attempt(action.as_ref(), ctx).await;
                        report(&name, criticality, &outcome);
                        outcome
                    }
                    Ok(false) if criticality == Criticality::Critical => {
                        ui::error(&format!("{} is required, aborting", name));
                        records.push(PhaseRecord {
                            name: name.clone(),
                            criticality,
                            outcome: Outcome::skipped("declined"),
                        });
                        aborted_at = Some(name);
                        break;
                    }
                    Ok(false) => {
                        ui::info(&format!("Skipping {} (declined)", name));
                        Outcome::skipped("declined")
                    }
                    // Not confirmed, so never attempted; criticality decides below.
                    Err(e) => {
                        let outcome = Outcome::Failure(e.to_string());
                        report(&name, criticality, &outcome);
                        outcome
                    }
                }
            };

            let succeeded = outcome.is_success();
            let failed = outcome.is_failure();
            records.push(PhaseRecord {
                name: name.clone(),
                criticality,
                outcome,
            });

            if failed && criticality == Criticality::Critical {
                aborted_at = Some(name);
                break;
            }

            if succeeded {
                for followup in on_success.into_iter().rev() {
                    queue.push_front(followup);
                }
            } else {
                let mut pending: Vec<Phase> = on_success;
                while let Some(skipped) = pending.pop() {
                    index += 1;
                    records.push(PhaseRecord {
                        name: skipped.name,
                        criticality: skipped.criticality,
                        outcome: Outcome::skipped(format!("requires {}", name)),
                    });
                    pending.extend(skipped.on_success);
                }
            }
        }

        Ok(PipelineReport {
            records,
            aborted_at,
            dry_run: false,
            elapsed: started.elapsed(),
        })
    }
}

/// Run one installer, turning errors and panics into `Failure`.
async fn attempt(action: &dyn Installer, ctx: &InstallContext) -> Outcome {
    match AssertUnwindSafe(action.attempt(ctx)).catch_unwind().await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => Outcome::Failure(e.to_string()),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("{} panicked: {}", action.name(), message);
            Outcome::Failure(format!("panicked: {}", message))
        }
    }
}

fn report(name: &str, criticality: Criticality, outcome: &Outcome) {
    match (outcome, criticality) {
        (Outcome::Success, _) => ui::success(name),
        (Outcome::Skipped(reason), _) => ui::info(&format!("{} skipped: {}", name, reason)),
        (Outcome::Failure(reason), Criticality::Critical) => {
            ui::error(&format!("{} failed: {}", name, reason))
        }
        (Outcome::Failure(reason), Criticality::Optional) => {
            ui::warn(&format!("{} failed, continuing: {}", name, reason))
        }
    }
}

/// Snapshot of the managed files, as a pipeline phase.
pub struct BackupPhase {
    manager: BackupManager,
}

impl BackupPhase {
    pub fn new(manager: BackupManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Installer for BackupPhase {
    fn name(&self) -> &str {
        "Backup"
    }

    async fn attempt(&self, _ctx: &InstallContext) -> Result<Outcome> {
        let result = self.manager.backup(false);
        if !result.success {
            return Ok(Outcome::Failure(
                result.error.unwrap_or_else(|| "backup failed".to_string()),
            ));
        }

        match (&result.backup_dir, result.files.len()) {
            (_, 0) => ui::info("No existing config files to backup"),
            (Some(dir), n) => ui::info(&format!("Backed up {} files to {}", n, dir.display())),
            (None, _) => {}
        }
        Ok(Outcome::Success)
    }
}

pub struct WriteConfigsPhase {
    writer: ConfigWriter,
}

impl WriteConfigsPhase {
    pub fn new(writer: ConfigWriter) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl Installer for WriteConfigsPhase {
    fn name(&self) -> &str {
        "Write configuration files"
    }

    async fn attempt(&self, _ctx: &InstallContext) -> Result<Outcome> {
        self.writer.write_configs()?;
        Ok(Outcome::Success)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub skip_backup: bool,
    pub dry_run: bool,
    pub minimal: bool,
    pub interactive: bool,
}

/// The canonical install sequence.
pub fn standard_phases(
    options: &InstallOptions,
    backup: BackupManager,
    writer: ConfigWriter,
) -> Vec<Phase> {
    vec![
        Phase::critical(BackupPhase::new(backup)).skip_if(options.skip_backup, "--skip-backup"),
        Phase::critical(ZshInstaller),
        Phase::critical(OhMyZshInstaller),
        Phase::critical(AntigenInstaller),
        Phase::optional(FontInstaller).skip_if(options.minimal, "--minimal"),
        Phase::optional(FzfInstaller),
        Phase::optional(EzaInstaller),
        Phase::optional(CarapaceInstaller).skip_if(options.minimal, "--minimal"),
        Phase::critical(AsdfInstaller),
        Phase::optional(NodeInstaller),
        Phase::optional(TmuxInstaller).then(Phase::optional(TpmInstaller)),
        Phase::critical(WriteConfigsPhase::new(writer)),
        Phase::optional(DefaultShellInstaller),
    ]
}
