//! In-memory [`Host`] used by tests. Records every call and never touches
//! the real machine.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{CommandSpec, ExecOutput, Host};
use crate::error::{BtError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Execute(CommandSpec),
    Download { url: String, dest: PathBuf },
    FetchText(String),
    Reachable(String),
    ReadFile(PathBuf),
    CreateDir(PathBuf),
    Remove(PathBuf),
}

#[derive(Debug, Clone)]
struct Response {
    prefix: String,
    output: ExecOutput,
    probe: bool,
}

#[derive(Debug, Clone, Default)]
struct Effect {
    prefix: String,
    commands: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    commands: BTreeMap<String, PathBuf>,
    paths: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    texts: BTreeMap<String, String>,
    responses: Vec<Response>,
    effects: Vec<Effect>,
    failing_downloads: Vec<String>,
    reachable: bool,
    calls: Vec<Call>,
}

#[derive(Debug, Default)]
pub struct FakeHost {
    state: Mutex<State>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    /// Put `name` on the fake PATH at `/usr/bin/<name>`.
    pub fn with_command(self, name: &str) -> Self {
        self.with_state(|s| {
            s.commands
                .insert(name.to_string(), PathBuf::from("/usr/bin").join(name));
        })
    }

    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.with_state(|s| {
            s.paths.insert(path);
        })
    }

    /// Commands whose display line starts with `prefix` exit with `code`.
    pub fn respond(self, prefix: &str, code: i32, stdout: &str, stderr: &str) -> Self {
        self.push_response(prefix, code, stdout, stderr, false)
    }

    /// Like [`respond`](Self::respond), for read-only queries that do not
    /// count as mutations.
    pub fn probe(self, prefix: &str, code: i32, stdout: &str) -> Self {
        self.push_response(prefix, code, stdout, "", true)
    }

    fn push_response(self, prefix: &str, code: i32, stdout: &str, stderr: &str, probe: bool) -> Self {
        self.with_state(|s| {
            s.responses.push(Response {
                prefix: prefix.to_string(),
                output: ExecOutput {
                    code,
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                },
                probe,
            })
        })
    }

    /// After a command starting with `prefix` runs, `command` is on the PATH.
    pub fn on_run_provides_command(self, prefix: &str, command: &str) -> Self {
        self.with_state(|s| {
            s.effects.push(Effect {
                prefix: prefix.to_string(),
                commands: vec![command.to_string()],
            })
        })
    }

    /// Seed a file readable through [`Host::read_file`].
    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        let path = path.into();
        self.with_state(|s| {
            s.files.insert(path, contents.as_bytes().to_vec());
        })
    }

    pub fn with_text(self, url: &str, body: &str) -> Self {
        self.with_state(|s| {
            s.texts.insert(url.to_string(), body.to_string());
        })
    }

    /// Downloads of URLs starting with `prefix` fail with HTTP 404.
    pub fn failing_download(self, prefix: &str) -> Self {
        self.with_state(|s| s.failing_downloads.push(prefix.to_string()))
    }

    pub fn reachable_network(self) -> Self {
        self.with_state(|s| s.reachable = true)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Display lines of every executed command, in order.
    pub fn runs(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Execute(spec) => Some(spec.display()),
                _ => None,
            })
            .collect()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.runs().iter().any(|r| r.starts_with(prefix))
    }

    pub fn downloads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Download { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Remove(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    /// Calls that would change the machine: downloads, directory creation,
    /// removals and every
    /// command not registered with [`probe`](Self::probe).
    pub fn mutations(&self) -> Vec<Call> {
        let state = self.state.lock().unwrap();
        state
            .calls
            .iter()
            .filter(|c| match c {
                Call::Execute(spec) => {
                    let line = spec.display();
                    !state
                        .responses
                        .iter()
                        .any(|r| r.probe && line.starts_with(&r.prefix))
                }
                Call::Download { .. } | Call::CreateDir(_) | Call::Remove(_) => true,
                _ => false,
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Host for FakeHost {
    fn command_path(&self, name: &str) -> Option<PathBuf> {
        self.state.lock().unwrap().commands.get(name).cloned()
    }

    fn path_exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.paths.contains(path) || state.files.contains_key(path)
    }

    async fn execute(&self, spec: &CommandSpec) -> Result<ExecOutput> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Execute(spec.clone()));

        let line = spec.display();
        let output = state
            .responses
            .iter()
            .rev()
            .find(|r| line.starts_with(&r.prefix))
            .map(|r| r.output.clone())
            .unwrap_or_default();

        if output.success() {
            let effects: Vec<Effect> = state
                .effects
                .iter()
                .filter(|e| line.starts_with(&e.prefix))
                .cloned()
                .collect();
            for effect in effects {
                for cmd in effect.commands {
                    let path = PathBuf::from("/usr/bin").join(&cmd);
                    state.commands.insert(cmd, path);
                }
            }
        }

        Ok(output)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Download {
            url: url.to_string(),
            dest: dest.to_path_buf(),
        });

        if state.failing_downloads.iter().any(|p| url.starts_with(p)) {
            return Err(BtError::Download {
                url: url.to_string(),
                status: 404,
            });
        }

        state.paths.insert(dest.to_path_buf());
        Ok(())
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::FetchText(url.to_string()));
        state.texts.get(url).cloned().ok_or_else(|| BtError::Download {
            url: url.to_string(),
            status: 404,
        })
    }

    async fn reachable(&self, url: &str, _timeout: Duration) -> bool {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Reachable(url.to_string()));
        state.reachable
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ReadFile(path.to_path_buf()));
        match state.files.get(path) {
            Some(bytes) => Ok(String::from_utf8_lossy(bytes).to_string()),
            None => Err(BtError::fs(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            )),
        }
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateDir(path.to_path_buf()));
        state.paths.insert(path.to_path_buf());
        Ok(())
    }

    async fn remove_path(&self, path: &Path) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Remove(path.to_path_buf()));
        state.paths.retain(|p| !p.starts_with(path));
        state.files.retain(|p, _| !p.starts_with(path));
    }
}
