use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use fs2::FileExt;

use crate::error::{BtError, Result};

pub const LOCK_FILE: &str = ".better-terminal.lock";

/// Exclusive advisory lock on `<home>/.better-terminal.lock`, held for the
/// length of a mutating run.
///
/// The file itself is never removed: every run must lock the same inode, so
/// dropping only clears the recorded pid and releases the lock.
#[derive(Debug)]
pub struct RunLock {
    file: File,
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = self.file.set_len(0);
        let _ = self.file.unlock();
    }
}

/// Take the run lock for `home` without blocking.
pub fn acquire(home: &Path) -> Result<RunLock> {
    let path = home.join(LOCK_FILE);
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&path)
        .map_err(|e| BtError::fs(&path, e))?;

    match file.try_lock_exclusive() {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::WouldBlock
            || e.raw_os_error() == fs2::lock_contended_error().raw_os_error() =>
        {
            return Err(BtError::Lock(format!(
                "Another better-terminal run is in progress (lock held at {})",
                path.display()
            )));
        }
        Err(e) => return Err(BtError::fs(&path, e)),
    }

    // Owner pid, for whoever finds a stale file.
    file.set_len(0).map_err(|e| BtError::fs(&path, e))?;
    writeln!(file, "{}", std::process::id()).map_err(|e| BtError::fs(&path, e))?;

    tracing::debug!("Acquired run lock {}", path.display());
    Ok(RunLock { file })
}
