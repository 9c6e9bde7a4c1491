use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::builder::gradle::{GradleOptions, GradlePackager};
use crate::builder::xcode::{XcodeOptions, XcodePackager};
use crate::builder::Packager;
use crate::config::Settings;
use crate::invoker::ProcessRunner;

/// Runs the three packager stages and reports what was produced.
pub fn execute_package_pipeline(
    packager: &dyn Packager,
    runner: &dyn ProcessRunner,
    label: &str,
) -> Result<Vec<PathBuf>> {
    let start_time = Instant::now();

    packager
        .check_env()
        .context("Environment validation failed")?;

    println!("{} Packaging {}...", "[INFO]".cyan(), label);
    packager
        .package(runner)
        .with_context(|| format!("{label} packaging failed"))?;

    let outputs = packager
        .find_output()
        .context("Unable to locate packaged artifact")?;
    if outputs.is_empty() {
        println!("{} No package found at the expected location", "[WARN]".yellow());
    }
    for path in &outputs {
        println!("{} Artifact located at: {}", "[INFO]".cyan(), path.display());
    }

    println!(
        "{} Packaging completed in {:.2}s",
        "[DONE]".green().bold(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(outputs)
}

/// Execute android packaging pipeline
pub fn execute_android_pipeline(
    settings: &Settings,
    runner: &dyn ProcessRunner,
    options: GradleOptions,
) -> Result<Vec<PathBuf>> {
    let packager = GradlePackager::new(&settings.gradle_home, options);
    execute_package_pipeline(&packager, runner, "android")
}

/// Execute iOS packaging pipeline
pub fn execute_ios_pipeline(runner: &dyn ProcessRunner, options: XcodeOptions) -> Result<Vec<PathBuf>> {
    let packager = XcodePackager::new(options);
    execute_package_pipeline(&packager, runner, "iOS")
}
