//! Runs static editor methods in batch mode.
//!
//! An invocation injects the helper scripts into the project, launches the
//! editor with a serialized [`CallChain`], and removes the scripts again no
//! matter how the process ended.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::BuildError;

pub mod chain;
pub mod inject;
pub mod runner;

pub use chain::{CallChain, MethodCall, DEFAULT_DISPATCHER};
pub use inject::HelperInjection;
pub use runner::{CapturedOutput, CommandLine, ProcessRunner, SystemRunner};

/// Everything needed for one editor invocation. Never persisted.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub project_path: PathBuf,
    pub tool_executable: PathBuf,
    pub log_file: Option<PathBuf>,
    /// Platform the editor switches to before loading the project.
    pub switch_target: Option<String>,
    pub batch_mode: bool,
    pub auto_quit: bool,
    pub chain: CallChain,
}

/// Orchestrates setup, process launch and guaranteed cleanup.
pub struct ProcessInvoker<'r> {
    runner: &'r dyn ProcessRunner,
    scripts_dir: PathBuf,
    dispatcher: String,
}

impl<'r> ProcessInvoker<'r> {
    pub fn new(runner: &'r dyn ProcessRunner, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            scripts_dir: scripts_dir.into(),
            dispatcher: DEFAULT_DISPATCHER.to_string(),
        }
    }

    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: impl Into<String>) -> Self {
        self.dispatcher = dispatcher.into();
        self
    }

    /// Assembles the editor command line for `req`.
    pub fn command_line(&self, req: &InvocationRequest, invoke_log: &Path) -> CommandLine {
        let mut cmd = CommandLine::new(&req.tool_executable);
        if let Some(log) = &req.log_file {
            cmd = cmd.arg("-logFile").arg(log);
        }
        cmd = cmd.arg("-projectPath").arg(&req.project_path);
        if let Some(target) = &req.switch_target {
            cmd = cmd.arg("-buildTarget").arg(target);
        }
        if req.batch_mode {
            cmd = cmd.arg("-batchmode");
        }
        if req.auto_quit {
            cmd = cmd.arg("-quit");
        }
        cmd.arg("-invokeLog")
            .arg(invoke_log)
            .args(req.chain.to_args(&self.dispatcher))
    }

    /// Runs one invocation.
    ///
    /// # Errors
    /// - [`BuildError::ProjectNotFound`] before anything is touched.
    /// - [`BuildError::ExternalProcessFailed`] on a non-zero exit, after cleanup.
    /// - [`BuildError::Launch`] when the editor could not be started, after cleanup.
    pub fn invoke(&self, req: &InvocationRequest) -> Result<(), BuildError> {
        if !req.project_path.is_dir() {
            return Err(BuildError::ProjectNotFound {
                path: req.project_path.clone(),
            });
        }

        info!(
            executable = %req.tool_executable.display(),
            project = %req.project_path.display(),
            log_file = ?req.log_file,
            switch_target = ?req.switch_target,
            batch_mode = req.batch_mode,
            quit = req.auto_quit,
            "invoking editor"
        );
        for call in req.chain.calls() {
            info!("  {} {}", call.name, call.args.join(" "));
        }

        let injection = HelperInjection::acquire(&req.project_path, &self.scripts_dir)?;
        let cmd = self.command_line(req, &injection.invoke_log());
        info!("{cmd}");

        let outcome = self.runner.run(&cmd).map_err(|source| BuildError::Launch {
            program: cmd.program_name(),
            source,
        });
        let released = injection.release();

        match outcome {
            Ok(0) => released,
            Ok(exit_code) => {
                if let Err(e) = released {
                    warn!(error = %e, "cleanup failed after editor failure");
                }
                warn!(exit_code, "editor exited with failure");
                Err(BuildError::ExternalProcessFailed { exit_code })
            }
            Err(e) => {
                if let Err(cleanup) = released {
                    warn!(error = %cleanup, "cleanup failed after launch failure");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::path::PathBuf;

    use super::runner::{CapturedOutput, CommandLine, ProcessRunner};

    /// Scripted outcome for one fake process run.
    pub enum Outcome {
        Exit(i32),
        LaunchError,
        Output(i32, Vec<u8>),
    }

    /// Records commands and replays scripted outcomes; defaults to exit 0.
    ///
    /// `on_run` sees the command before the outcome is returned, which lets
    /// tests inspect the filesystem while the "process" is alive.
    #[derive(Default)]
    pub struct FakeRunner {
        pub outcomes: RefCell<VecDeque<Outcome>>,
        pub calls: RefCell<Vec<CommandLine>>,
        pub on_run: Option<Box<dyn Fn(&CommandLine)>>,
    }

    impl FakeRunner {
        pub fn with(outcomes: Vec<Outcome>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
                ..Self::default()
            }
        }

        fn next(&self, cmd: &CommandLine) -> Outcome {
            self.calls.borrow_mut().push(cmd.clone());
            if let Some(hook) = &self.on_run {
                hook(cmd);
            }
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or(Outcome::Exit(0))
        }

        pub fn programs(&self) -> Vec<PathBuf> {
            self.calls.borrow().iter().map(|c| c.program.clone()).collect()
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, cmd: &CommandLine) -> io::Result<i32> {
            match self.next(cmd) {
                Outcome::Exit(code) | Outcome::Output(code, _) => Ok(code),
                Outcome::LaunchError => Err(io::Error::new(io::ErrorKind::NotFound, "no such tool")),
            }
        }

        fn capture(&self, cmd: &CommandLine) -> io::Result<CapturedOutput> {
            match self.next(cmd) {
                Outcome::Exit(exit_code) => Ok(CapturedOutput {
                    exit_code,
                    stdout: Vec::new(),
                }),
                Outcome::Output(exit_code, stdout) => Ok(CapturedOutput { exit_code, stdout }),
                Outcome::LaunchError => Err(io::Error::new(io::ErrorKind::NotFound, "no such tool")),
            }
        }
    }
}
