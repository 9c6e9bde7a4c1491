use super::Packager;
use crate::error::BuildError;
use crate::invoker::runner::{require_path, run_checked};
use crate::invoker::{CommandLine, ProcessRunner};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Options for packaging an exported android project.
#[derive(Debug, Clone, Default)]
pub struct GradleOptions {
    pub project: PathBuf,
    pub build_file: Option<PathBuf>,
    pub tasks: Vec<String>,
    pub variants: Vec<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub properties: Vec<String>,
    pub no_default_properties: bool,
}

/// Gradle packager
///
/// Runs the gradle wrapper shipped next to the tool against the exported
/// project, so the project itself does not need a wrapper.
pub struct GradlePackager {
    gradle_home: PathBuf,
    windows_host: bool,
    options: GradleOptions,
}

impl GradlePackager {
    pub fn new(gradle_home: impl Into<PathBuf>, options: GradleOptions) -> Self {
        Self::for_host(gradle_home, options, cfg!(target_os = "windows"))
    }

    pub fn for_host(gradle_home: impl Into<PathBuf>, options: GradleOptions, windows_host: bool) -> Self {
        Self {
            gradle_home: gradle_home.into(),
            windows_host,
            options,
        }
    }

    pub fn wrapper(&self) -> PathBuf {
        let name = if self.windows_host { "gradlew.bat" } else { "gradlew" };
        self.gradle_home.join(name)
    }

    pub fn build_file(&self) -> PathBuf {
        self.options
            .build_file
            .clone()
            .unwrap_or_else(|| self.options.project.join("build.gradle"))
    }

    /// Gradle command line for the configured tasks.
    pub fn command_line(&self) -> Result<CommandLine> {
        let project = &self.options.project;
        let mut cmd = CommandLine::new(self.wrapper())
            .arg("-p")
            .arg(project)
            .arg("-b")
            .arg(self.build_file());

        if !self.options.no_default_properties {
            let base_name = project
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            cmd = cmd.args([
                "-P".to_string(),
                format!("targetProjDir={}", project.display()),
                "-P".to_string(),
                format!("buildDir={}", project.join("build").display()),
                "-P".to_string(),
                format!("archivesBaseName={base_name}"),
            ]);
        }
        for prop in &self.options.properties {
            cmd = cmd.arg("-P").arg(prop);
        }

        Ok(cmd.args(task_names(
            &self.options.tasks,
            &self.options.variants,
            self.options.prefix.as_deref(),
            self.options.suffix.as_deref(),
        )?))
    }
}

impl Packager for GradlePackager {
    fn check_env(&self) -> Result<()> {
        if !self.options.project.is_dir() {
            return Err(BuildError::ProjectNotFound {
                path: self.options.project.clone(),
            }
            .into());
        }
        require_path(&self.build_file())?;
        require_path(&self.wrapper())?;
        Ok(())
    }

    fn package(&self, runner: &dyn ProcessRunner) -> Result<()> {
        let cmd = self.command_line()?;
        info!(
            project = %self.options.project.display(),
            build_file = %self.build_file().display(),
            "packaging android project"
        );
        run_checked(runner, &cmd)?;
        Ok(())
    }

    fn find_output(&self) -> Result<Vec<PathBuf>> {
        let outputs = self.options.project.join("build").join("outputs");
        let mut found = collect_packages(&outputs);
        found.sort();
        Ok(found)
    }
}

fn collect_packages(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|e| e == "apk" || e == "aab"))
        .collect()
}

/// Resolves the gradle tasks to run.
///
/// Explicit tasks win. Otherwise each variant becomes
/// `{prefix}{Variant}{Suffix}`; the variant is only capitalized when a
/// prefix precedes it, so `--var assembleRelease` alone runs as-is.
pub fn task_names(
    tasks: &[String],
    variants: &[String],
    prefix: Option<&str>,
    suffix: Option<&str>,
) -> Result<Vec<String>> {
    if !tasks.is_empty() {
        return Ok(tasks.to_vec());
    }
    if variants.is_empty() {
        anyhow::bail!("No gradle task to execute. Specify --task or --var.");
    }
    if prefix.is_none() && suffix.is_none() {
        warn!("variants given without task prefix or suffix");
    }

    let suffix = suffix.map(capitalize).unwrap_or_default();
    Ok(variants
        .iter()
        .map(|var| match prefix {
            Some(pfx) => format!("{pfx}{}{suffix}", capitalize(var)),
            None => format!("{var}{suffix}"),
        })
        .collect())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
