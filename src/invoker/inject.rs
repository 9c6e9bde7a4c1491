//! Scoped injection of the helper editor scripts into a Unity project.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::error::BuildError;
use crate::fsops;

/// Project-relative directory owning everything the injection writes.
pub const HELPER_ROOT: &str = "Assets/_UnityBuildUtility";
/// Editor-only folder the helper scripts are compiled from.
pub const HELPER_EDITOR_DIR: &str = "Assets/_UnityBuildUtility/Editor";
/// Helper scripts copied from the scripts directory into the project.
pub const HELPER_SCRIPTS: [&str; 2] = ["BuildUtility.cs", "Invoker.cs"];
/// Sidecar suffix the editor generates next to every asset.
pub const META_SUFFIX: &str = ".meta";
/// Log file the dispatcher writes inside the project.
pub const INVOKE_LOG_NAME: &str = "invoke.log";
/// Advisory lock guarding the helper directory against overlapping runs.
pub const LOCK_FILE_NAME: &str = ".buildutil.lock";

/// Scoped injection of the helper scripts into a project.
///
/// Holds an exclusive advisory lock on the project while alive. Cleanup
/// runs exactly once: through [`HelperInjection::release`] on the normal
/// path, or from `Drop` when the owner bails out early.
pub struct HelperInjection {
    project: PathBuf,
    lock: Option<File>,
    released: bool,
}

impl HelperInjection {
    /// Locks the project and copies the helper scripts into it.
    ///
    /// A partially completed copy is rolled back when this returns an error.
    pub fn acquire(project: &Path, scripts_dir: &Path) -> Result<Self, BuildError> {
        let lock = lock_project(project)?;
        let guard = Self {
            project: project.to_path_buf(),
            lock: Some(lock),
            released: false,
        };

        let target_dir = guard.project.join(HELPER_EDITOR_DIR);
        for name in HELPER_SCRIPTS {
            fsops::copy(&scripts_dir.join(name), &target_dir.join(name), false, false)?;
        }
        debug!(dir = %target_dir.display(), "helper scripts injected");

        Ok(guard)
    }

    pub fn invoke_log(&self) -> PathBuf {
        self.project.join(INVOKE_LOG_NAME)
    }

    /// Removes the injected files and releases the project lock.
    pub fn release(mut self) -> Result<(), BuildError> {
        self.cleanup()
    }

    fn cleanup(&mut self) -> Result<(), BuildError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let removed = fsops::delete(&self.project.join(HELPER_ROOT), &[META_SUFFIX]);
        let echoed = self.drain_invoke_log();

        // unlock only; the lock file stays for every later run
        if let Some(lock) = self.lock.take() {
            if let Err(e) = lock.unlock() {
                warn!(project = %self.project.display(), error = %e, "unable to unlock project");
            }
        }

        removed.and(echoed)
    }

    /// Copies the dispatcher's own log into ours, then deletes it.
    fn drain_invoke_log(&self) -> Result<(), BuildError> {
        let path = self.invoke_log();
        if !path.is_file() {
            return Ok(());
        }
        match fs::read_to_string(&path) {
            Ok(content) => {
                for line in content.lines() {
                    info!(target: "dispatcher", "{line}");
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "unable to read dispatcher log"),
        }
        fsops::delete(&path, &[])
    }
}

impl Drop for HelperInjection {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            warn!(project = %self.project.display(), error = %e, "helper cleanup failed");
        }
    }
}

fn lock_project(project: &Path) -> Result<File, BuildError> {
    let path = project.join(LOCK_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&path)
        .map_err(|e| BuildError::file_op("lock", &path, &path, Some(e)))?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(file),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(BuildError::ProjectBusy {
                path: project.to_path_buf(),
            })
        }
        Err(e) => Err(BuildError::file_op("lock", &path, &path, Some(e))),
    }
}
