//! The seam between installers and the machine they run on.
//!
//! Installers never spawn processes, touch the network or probe the
//! filesystem directly; they go through a [`Host`]. [`SystemHost`] is the
//! real implementation, tests use an in-memory fake.

mod system;

#[cfg(test)]
pub mod fake;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{BtError, Result};
use crate::ui;

pub use system::SystemHost;

#[cfg(unix)]
const PATH_SEPARATOR: &str = ":";
#[cfg(not(unix))]
const PATH_SEPARATOR: &str = ";";

/// Per-command working directory and environment overrides.
///
/// Overrides apply to a single child process. The environment of the
/// running process is never modified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Prepend `dirs` to `PATH`. The base is an earlier override if there is
    /// one, otherwise the inherited `PATH`.
    pub fn prepend_path(mut self, dirs: &[PathBuf]) -> Self {
        let base = self
            .env
            .get("PATH")
            .cloned()
            .or_else(|| std::env::var("PATH").ok())
            .unwrap_or_default();

        let mut parts: Vec<String> = dirs.iter().map(|d| d.display().to_string()).collect();
        if !base.is_empty() {
            parts.push(base);
        }
        self.env.insert("PATH".to_string(), parts.join(PATH_SEPARATOR));
        self
    }
}

/// A command to run, with its context and failure policy.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub context: ExecutionContext,
    /// Non-zero exit is returned as output instead of an error
    pub ignore_error: bool,
    /// Do not echo the command line
    pub silent: bool,
    /// Inherit stdin so the child can prompt (sudo, chsh)
    pub interactive: bool,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            context: ExecutionContext::default(),
            ignore_error: false,
            silent: false,
            interactive: false,
        }
    }

    /// Run `script` through `sh -c`.
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh", ["-c".to_string(), script.into()])
    }

    pub fn context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    pub fn ignore_error(mut self) -> Self {
        self.ignore_error = true;
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn display(&self) -> String {
        if self.program == "sh" && self.args.len() == 2 && self.args[0] == "-c" {
            return self.args[1].clone();
        }
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

#[async_trait]
pub trait Host: Send + Sync {
    /// Resolve a command on the PATH.
    fn command_path(&self, name: &str) -> Option<PathBuf>;

    fn command_exists(&self, name: &str) -> bool {
        self.command_path(name).is_some()
    }

    fn path_exists(&self, path: &Path) -> bool;

    /// Spawn the command and wait for it, capturing stdout and stderr.
    /// A non-zero exit is not an error at this level.
    async fn execute(&self, spec: &CommandSpec) -> Result<ExecOutput>;

    /// Download `url` into `dest`, creating parent directories.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;

    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// Single HEAD request bounded by `timeout`.
    async fn reachable(&self, url: &str, timeout: Duration) -> bool;

    async fn read_file(&self, path: &Path) -> Result<String>;

    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Best-effort removal of a temporary file or directory tree. Failures
    /// are logged, never returned.
    async fn remove_path(&self, path: &Path);

    /// Run a command applying its failure policy: echo it unless silent,
    /// turn a non-zero exit into [`BtError::Subprocess`] unless
    /// `ignore_error` is set.
    async fn run(&self, spec: &CommandSpec) -> Result<ExecOutput> {
        if !spec.silent {
            ui::command(&spec.display());
        }

        let output = match self.execute(spec).await {
            Ok(output) => output,
            Err(e) if spec.ignore_error => {
                tracing::debug!("Ignoring failure to run `{}`: {}", spec.display(), e);
                return Ok(ExecOutput {
                    code: -1,
                    stdout: String::new(),
                    stderr: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        if output.success() || spec.ignore_error {
            return Ok(output);
        }

        Err(BtError::Subprocess {
            command: spec.display(),
            code: output.code,
            stderr: output.stderr,
        })
    }
}
