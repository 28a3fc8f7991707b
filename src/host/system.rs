use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::process::Command;

use super::{CommandSpec, ExecOutput, Host};
use crate::error::{BtError, Result};
use crate::ui;

/// Overall timeout for a single HTTP request (downloads included).
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

const USER_AGENT: &str = concat!("better-terminal/", env!("CARGO_PKG_VERSION"));

/// Host backed by the real process table, filesystem and network.
#[derive(Debug, Clone)]
pub struct SystemHost {
    client: Client,
}

impl SystemHost {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Host for SystemHost {
    fn command_path(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    async fn execute(&self, spec: &CommandSpec) -> Result<ExecOutput> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(&spec.context.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if spec.interactive {
                Stdio::inherit()
            } else {
                Stdio::null()
            });

        if let Some(cwd) = &spec.context.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!(command = %spec.display(), "spawning");

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BtError::DependencyMissing(format!("`{}` is not installed", spec.program))
            } else {
                BtError::Io(e)
            }
        })?;

        let result = ExecOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        tracing::debug!(command = %spec.display(), code = result.code, "finished");
        Ok(result)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let _spinner = ui::spinner(format!("Downloading {}", url));

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BtError::Download {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BtError::fs(parent, e))?;
        }
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| BtError::fs(dest, e))?;

        tracing::debug!("Downloaded {} bytes from {} to {}", bytes.len(), url, dest.display());
        Ok(())
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BtError::Download {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    async fn reachable(&self, url: &str, timeout: Duration) -> bool {
        match self.client.head(url).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("HEAD {} failed: {}", url, e);
                false
            }
        }
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BtError::fs(path, e))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| BtError::fs(path, e))
    }

    async fn remove_path(&self, path: &Path) {
        let removed = match tokio::fs::symlink_metadata(path).await {
            Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(path).await,
            Ok(_) => tokio::fs::remove_file(path).await,
            Err(e) => Err(e),
        };
        match removed {
            Ok(()) => tracing::debug!("Removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::debug!("Could not remove {}: {}", path.display(), e),
        }
    }
}
