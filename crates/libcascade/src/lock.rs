use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use fs4::FileExt;
use tracing::debug;

use crate::error::{CascadeError, Result};

/// Name of the lock file created inside the git directory.
pub const LOCK_FILE_NAME: &str = "cascade.lock";

/// Exclusive hold on a working copy for the duration of one cascade run.
///
/// Only one branch can be checked out at a time, so two runs sharing a
/// working copy would trample each other. The lock is released on drop.
#[derive(Debug)]
pub struct RepoLock {
    /// The locked file handle.
    lock_file: fs::File,
    /// Path to the lock file.
    path: PathBuf,
}

impl RepoLock {
    /// Take the lock in `git_dir` without waiting.
    ///
    /// Fails with [`CascadeError::Locked`] if another run already holds it.
    pub fn acquire(git_dir: &Path) -> Result<Self> {
        let path = git_dir.join(LOCK_FILE_NAME);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        // The file is open, so a refused lock means someone else holds it.
        if let Err(err) = FileExt::try_lock_exclusive(&lock_file) {
            debug!(path = %path.display(), error = %err, "lock refused");
            return Err(CascadeError::Locked { path });
        }

        Ok(Self { lock_file, path })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepoLock {
    #[allow(clippy::let_underscore_must_use)]
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.lock_file);
    }
}
