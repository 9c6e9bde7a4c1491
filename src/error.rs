use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code used for failures that did not come from an external tool.
pub const INTERNAL_ERROR_EXIT_CODE: i32 = 2;

/// Errors raised by the invocation core.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Project directory not found: {}", path.display())]
    ProjectNotFound { path: PathBuf },

    #[error("Unknown build target: {target}")]
    UnknownBuildTarget { target: String },

    #[error("Call chain must contain at least one method call")]
    EmptyChain,

    #[error("External process failed with exit code {exit_code}")]
    ExternalProcessFailed { exit_code: i32 },

    #[error("{op} failed: {} -> {}", src.display(), dst.display())]
    FileOpFailed {
        op: &'static str,
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: Option<io::Error>,
    },

    #[error("Required tool or file not found: {}", path.display())]
    ToolNotFound { path: PathBuf },

    #[error("Project is locked by another invocation: {}", path.display())]
    ProjectBusy { path: PathBuf },

    #[error("Expected a single exported directory in {}, found {count}", dir.display())]
    AmbiguousExport { dir: PathBuf, count: usize },

    #[error("Failed to launch {program}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    pub(crate) fn file_op(
        op: &'static str,
        src: impl Into<PathBuf>,
        dst: impl Into<PathBuf>,
        source: Option<io::Error>,
    ) -> Self {
        BuildError::FileOpFailed {
            op,
            src: src.into(),
            dst: dst.into(),
            source,
        }
    }

    /// Process exit code a wrapping CLI should mirror for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::ExternalProcessFailed { exit_code } => *exit_code,
            _ => INTERNAL_ERROR_EXIT_CODE,
        }
    }
}

/// Finds the first [`BuildError`] in an `anyhow` chain and returns its exit code.
pub fn exit_code_of(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|e| e.downcast_ref::<BuildError>())
        .map(BuildError::exit_code)
        .unwrap_or(INTERNAL_ERROR_EXIT_CODE)
}
