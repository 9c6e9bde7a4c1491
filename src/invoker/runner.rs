//! Launching external tools behind a swappable process runner.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use crate::error::BuildError;

/// A fully assembled external command: program plus argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Arguments as lossy UTF-8, mainly for assertions and logging.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a process run with [`ProcessRunner::capture`].
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
}

/// Seam between orchestration and real child processes.
///
/// Implementations block until the process exits. An `Err` means the
/// process could not be launched at all.
pub trait ProcessRunner {
    /// Runs the command with inherited stdio and returns its exit code.
    fn run(&self, cmd: &CommandLine) -> io::Result<i32>;

    /// Runs the command and captures stdout.
    fn capture(&self, cmd: &CommandLine) -> io::Result<CapturedOutput>;
}

/// [`ProcessRunner`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(cmd: &CommandLine) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        if let Some(dir) = &cmd.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, cmd: &CommandLine) -> io::Result<i32> {
        let status = Self::command(cmd).status()?;
        // killed by a signal: no exit code to mirror
        Ok(status.code().unwrap_or(-1))
    }

    fn capture(&self, cmd: &CommandLine) -> io::Result<CapturedOutput> {
        let output = Self::command(cmd).output()?;
        Ok(CapturedOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
        })
    }
}

/// Checks that a required tool or file is present before launching anything.
pub fn require_path(path: &Path) -> Result<(), BuildError> {
    if path.exists() {
        Ok(())
    } else {
        Err(BuildError::ToolNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Logs and runs `cmd`, treating any non-zero exit as fatal.
pub fn run_checked(runner: &dyn ProcessRunner, cmd: &CommandLine) -> Result<(), BuildError> {
    info!("{cmd}");
    let exit_code = runner.run(cmd).map_err(|source| BuildError::Launch {
        program: cmd.program_name(),
        source,
    })?;
    if exit_code != 0 {
        warn!(exit_code, program = %cmd.program_name(), "command failed");
        return Err(BuildError::ExternalProcessFailed { exit_code });
    }
    Ok(())
}
