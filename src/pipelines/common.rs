use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::BuildError;
use crate::invoker::{CallChain, InvocationRequest, ProcessInvoker, ProcessRunner};
use crate::target;

/// Editor executable inside a Unity installation for the current host.
pub fn unity_executable_in(home: &Path) -> PathBuf {
    if cfg!(target_os = "windows") {
        home.join("Unity.exe")
    } else if cfg!(target_os = "macos") {
        home.join("Unity.app/Contents/MacOS/Unity")
    } else {
        home.join("Editor/Unity")
    }
}

/// Resolves and checks the editor executable from the configured home.
pub fn unity_executable(settings: &Settings) -> Result<PathBuf> {
    let home = settings
        .unity_home
        .as_deref()
        .context("Unity home is not set. Use --unity-home, UNITY_HOME or [unity].home in buildutil.toml.")?;
    let exe = unity_executable_in(home);
    if !exe.is_file() {
        return Err(BuildError::ToolNotFound { path: exe }.into());
    }
    Ok(exe)
}

/// Absolute, `..`-free form of `path` with a leading `~` expanded.
///
/// The editor resolves relative paths against the project, not our
/// working directory.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    let expanded = expand_home(path);
    let absolute = std::path::absolute(&expanded)
        .with_context(|| format!("Invalid path: {}", path.display()))?;
    Ok(target::normalize_lexically(&absolute))
}

/// `~` and `~/rest` resolve against the user's home directory; `~user`
/// forms are left alone.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Fails early when `project` is not a directory.
pub fn require_project(project: &Path) -> Result<PathBuf> {
    if !project.is_dir() {
        return Err(BuildError::ProjectNotFound {
            path: project.to_path_buf(),
        }
        .into());
    }
    absolute(project)
}

/// Runs `chain` against `project` with the editor at `unity`.
pub fn invoke_chain(
    settings: &Settings,
    runner: &dyn ProcessRunner,
    unity: PathBuf,
    project: PathBuf,
    chain: CallChain,
) -> Result<()> {
    let request = InvocationRequest {
        project_path: project,
        tool_executable: unity,
        log_file: settings.unity_log.as_deref().map(absolute).transpose()?,
        switch_target: settings.switch_target.clone(),
        batch_mode: settings.batch_mode,
        auto_quit: settings.quit,
        chain,
    };

    ProcessInvoker::new(runner, &settings.scripts_dir)
        .with_dispatcher(&settings.dispatcher)
        .invoke(&request)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_resolves_parent_components() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute(Path::new("builds/android/..")).unwrap(), cwd.join("builds"));
    }

    #[test]
    fn absolute_expands_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(absolute(Path::new("~/out")).unwrap(), target::normalize_lexically(&home.join("out")));
        assert_eq!(absolute(Path::new("~")).unwrap(), target::normalize_lexically(&home));
    }

    #[test]
    fn tilde_user_is_not_expanded() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute(Path::new("~other/out")).unwrap(), cwd.join("~other/out"));
    }
}
