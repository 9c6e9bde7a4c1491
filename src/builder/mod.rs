use anyhow::Result;
use std::path::PathBuf;

use crate::invoker::ProcessRunner;

pub mod gradle;
pub mod provision;
pub mod xcode;

/// Packaging pipeline interface for exported platform projects.
///
/// Implementations wrap one external build tool. They hold no state
/// between stages apart from their options.
pub trait Packager {
    /// Stage 1: precondition check.
    ///
    /// Verify the project directory and every tool or file the package
    /// step needs before anything is launched.
    fn check_env(&self) -> Result<()>;

    /// Stage 2: package execution.
    ///
    /// # Side effects
    /// - Launches external tools through `runner`; a non-zero exit is fatal.
    /// - Writes intermediate build output under the project directory.
    fn package(&self, runner: &dyn ProcessRunner) -> Result<()>;

    /// Stage 3: artifact resolution.
    ///
    /// Returns the packages produced by the last run, possibly empty when
    /// the tool writes outside the locations this packager knows about.
    fn find_output(&self) -> Result<Vec<PathBuf>>;
}
