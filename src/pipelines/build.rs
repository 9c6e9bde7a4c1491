use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::BuildError;
use crate::fsops;
use crate::invoker::{CallChain, ProcessRunner};
use crate::target::{self, BuildOptionSet, PlatformTarget};

use super::common::{absolute, invoke_chain, require_project, unity_executable};

/// Static method in the injected helper that builds the player.
pub const BUILD_PLAYER_METHOD: &str = "_BuildUtility.BuildPlayer";

/// Inputs of a player build.
#[derive(Debug, Clone, Default)]
pub struct BuildParams {
    pub project: PathBuf,
    pub target: String,
    pub output: PathBuf,
    /// Extra `|`-separated option tokens.
    pub options: Option<String>,
    pub export_only: bool,
    pub development: bool,
    /// Keep an android export nested under `<output>/<productName>/`.
    pub keep_product_dir: bool,
}

/// Execute player build pipeline
///
/// Flow:
/// 1. Resolve target, build options, project and editor
/// 2. Correct the output path for the target
/// 3. Remove artifacts of a previous build
/// 4. Invoke the build-player method in the editor
/// 5. Flatten a nested android export
///
/// Returns the corrected output path.
pub fn execute_build_pipeline(
    settings: &Settings,
    runner: &dyn ProcessRunner,
    params: &BuildParams,
) -> Result<PathBuf> {
    let start_time = Instant::now();

    // --- 1. Target & Options ---
    let target = PlatformTarget::from_alias(&params.target)?;
    let options = BuildOptionSet::from_flags(
        params.options.as_deref(),
        params.export_only,
        params.development,
    );
    let project = require_project(&params.project)?;
    let unity = unity_executable(settings)?;

    // --- 2. Output Path ---
    let requested = absolute(&params.output)?;
    let output = target::correct_output_path(&requested, target, &options);
    if output.file_name().is_none() {
        anyhow::bail!("Invalid output path: {}", params.output.display());
    }

    println!(
        "{} Building {} [{}] -> {}",
        "[INFO]".cyan(),
        project.display(),
        target,
        output.display()
    );
    info!(platform = %target, options = %options, output = %output.display(), "build player");

    // --- 3. Clean Slate ---
    remove_previous_artifacts(&requested, &output, target)?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    // --- 4. Invoke ---
    let chain = CallChain::new(
        BUILD_PLAYER_METHOD,
        [
            output.display().to_string(),
            target.editor_name().to_string(),
            options.serialize(),
        ],
    );
    invoke_chain(settings, runner, unity, project, chain).context("Unity build failed")?;

    // --- 5. Android Export Fix-up ---
    if target == PlatformTarget::Android
        && options.allows_external_modification()
        && !params.keep_product_dir
    {
        promote_export(&output)?;
    }

    println!(
        "{} Build completed in {:.2}s → {}",
        "[DONE]".green().bold(),
        start_time.elapsed().as_secs_f64(),
        output.display()
    );
    Ok(output)
}

fn remove_previous_artifacts(requested: &Path, output: &Path, target: PlatformTarget) -> Result<()> {
    fsops::delete(output, &[])?;
    if target.is_windows() {
        // the player writes <exe>_Data next to bin.exe; older layouts kept
        // it next to the requested directory
        fsops::delete(&target::windows_data_dir(output), &[])?;
        let root = target::normalize_lexically(requested);
        fsops::delete(&fsops::with_suffix(&root, "_Data"), &[])?;
    }
    Ok(())
}

/// Moves the single directory inside an android export up into `dir`.
///
/// No subdirectory is nothing to do; more than one is ambiguous.
pub fn promote_export(dir: &Path) -> Result<(), BuildError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(BuildError::file_op("promote", dir, dir, Some(e))),
    };

    let mut children: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();

    match children.len() {
        0 => {
            debug!(dir = %dir.display(), "no nested export directory");
            Ok(())
        }
        1 => {
            let nested = children.remove(0);
            info!(from = %nested.display(), to = %dir.display(), "flattening android export");

            // move the export aside first: it may hold an entry named like itself
            let staged = dir.join(".buildutil-promote");
            fsops::delete(&staged, &[])?;
            fs::rename(&nested, &staged)
                .map_err(|e| BuildError::file_op("promote", &nested, &staged, Some(e)))?;

            // on failure the export stays in the staging directory
            fsops::copy(&staged, dir, true, false)?;
            fsops::delete(&staged, &[])
        }
        count => Err(BuildError::AmbiguousExport {
            dir: dir.to_path_buf(),
            count,
        }),
    }
}
