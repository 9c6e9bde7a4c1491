use super::provision::{self, ProvisioningProfile};
use super::Packager;
use crate::error::BuildError;
use crate::fsops;
use crate::invoker::runner::{require_path, run_checked};
use crate::invoker::{CommandLine, ProcessRunner};
use crate::templates;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Build settings added to the archive step unless disabled.
const DEFAULT_ARCHIVE_SETTINGS: [&str; 4] = [
    "DEPLOYMENT_POSTPROCESSING=YES",
    "STRIP_INSTALLED_PRODUCT=YES",
    "SEPARATE_STRIP=YES",
    "COPY_PHASE_STRIP=YES",
];

/// Options for packaging an exported Xcode project.
#[derive(Debug, Clone)]
pub struct XcodeOptions {
    pub project: PathBuf,
    pub provisioning_profile: PathBuf,
    pub out_file: Option<PathBuf>,
    pub archive_file: Option<PathBuf>,
    pub product_name: Option<String>,
    pub debug: bool,
    pub target: String,
    pub sdk: String,
    pub keychain: Option<(PathBuf, String)>,
    pub extra_settings: Vec<String>,
    pub no_default_settings: bool,
}

/// Xcode packager
///
/// clean -> archive -> exportArchive, then moves the `.ipa` (and optionally
/// the `.xcarchive`) to the requested locations.
pub struct XcodePackager {
    options: XcodeOptions,
    mac_host: bool,
}

impl XcodePackager {
    pub fn new(options: XcodeOptions) -> Self {
        Self::for_host(options, cfg!(target_os = "macos"))
    }

    pub fn for_host(options: XcodeOptions, mac_host: bool) -> Self {
        Self { options, mac_host }
    }

    fn configuration(&self) -> &'static str {
        if self.options.debug {
            "Debug"
        } else {
            "Release"
        }
    }

    fn xcodeproj(&self) -> PathBuf {
        self.options
            .project
            .join(format!("{}.xcodeproj", self.options.target))
    }

    fn build_dir(&self) -> PathBuf {
        self.options.project.join("build")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.build_dir()
            .join(format!("{}.xcarchive", self.options.target))
    }

    fn export_options_path(&self) -> PathBuf {
        self.build_dir().join(format!("{}.plist", self.options.target))
    }

    fn exported_ipa(&self) -> PathBuf {
        self.build_dir().join(format!("{}.ipa", self.options.target))
    }

    /// Final `.ipa` location, `<project>.ipa` unless given.
    pub fn package_path(&self) -> PathBuf {
        self.options
            .out_file
            .clone()
            .unwrap_or_else(|| fsops::with_suffix(&self.options.project, ".ipa"))
    }

    pub fn clean_command(&self) -> CommandLine {
        CommandLine::new("xcodebuild")
            .arg("-project")
            .arg(self.xcodeproj())
            .args(["-target", self.options.target.as_str()])
            .args(["-configuration", self.configuration(), "clean"])
    }

    pub fn archive_command(&self, profile: &ProvisioningProfile, product_name: &str) -> CommandLine {
        let mut cmd = CommandLine::new("xcodebuild")
            .arg("-project")
            .arg(self.xcodeproj())
            .args(["-sdk", self.options.sdk.as_str()])
            // the default scheme carries the target's name
            .args(["-scheme", self.options.target.as_str()])
            .args(["-configuration", self.configuration()])
            .arg(format!("PROVISIONING_PROFILE={}", profile.uuid))
            .arg(format!("CODE_SIGN_IDENTITY={}", profile.signing_identity))
            .arg(format!("PRODUCT_NAME={product_name}"));
        if !self.options.no_default_settings {
            cmd = cmd.args(DEFAULT_ARCHIVE_SETTINGS);
        }
        cmd.arg("archive")
            .arg("-archivePath")
            .arg(self.archive_path())
            .args(&self.options.extra_settings)
    }

    pub fn export_command(&self) -> CommandLine {
        CommandLine::new("xcodebuild")
            .arg("-exportArchive")
            .arg("-archivePath")
            .arg(self.archive_path())
            .arg("-exportPath")
            .arg(self.build_dir())
            .args(["-configuration", self.configuration()])
            .arg("-exportOptionsPlist")
            .arg(self.export_options_path())
    }

    /// Best-effort keychain unlock; a failure is only reported.
    fn unlock_keychain(&self, runner: &dyn ProcessRunner) {
        let Some((path, password)) = &self.options.keychain else {
            return;
        };
        let cmd = CommandLine::new("security")
            .args(["unlock-keychain", "-p", password.as_str()])
            .arg(path);
        // password stays out of the log
        info!("security unlock-keychain -p ******** {}", path.display());
        match runner.run(&cmd) {
            Ok(0) => {}
            Ok(code) => warn!(exit_code = code, "unlock keychain failed"),
            Err(e) => warn!(error = %e, "unlock keychain failed"),
        }
    }

    fn relocate(src: &std::path::Path, dst: &std::path::Path) -> Result<()> {
        if !src.exists() {
            return Err(BuildError::ToolNotFound {
                path: src.to_path_buf(),
            })
            .context("Exported file not found");
        }
        fsops::copy(src, dst, false, false)?;
        fsops::delete(src, &[])?;
        Ok(())
    }
}

impl Packager for XcodePackager {
    fn check_env(&self) -> Result<()> {
        if !self.mac_host {
            anyhow::bail!("Packaging iOS is only supported on macOS");
        }
        require_path(&self.options.provisioning_profile)?;
        if !self.options.project.is_dir() {
            return Err(BuildError::ProjectNotFound {
                path: self.options.project.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn package(&self, runner: &dyn ProcessRunner) -> Result<()> {
        let profile = provision::inspect(runner, &self.options.provisioning_profile)?;
        let product_name = self
            .options
            .product_name
            .clone()
            .unwrap_or_else(|| profile.default_product_name.clone());

        info!(
            project = %self.options.project.display(),
            configuration = self.configuration(),
            xcode_target = %self.options.target,
            sdk = %self.options.sdk,
            bundle_id = %profile.bundle_id,
            profile = %profile.name,
            uuid = %profile.uuid,
            product = %product_name,
            output = %self.package_path().display(),
            "packaging iOS project"
        );

        self.unlock_keychain(runner);

        run_checked(runner, &self.clean_command()).context("xcodebuild clean failed")?;
        run_checked(runner, &self.archive_command(&profile, &product_name))
            .context("xcodebuild archive failed")?;
        if !self.archive_path().exists() {
            anyhow::bail!(
                "xcodebuild archive output not found: {}",
                self.archive_path().display()
            );
        }

        let plist = templates::export_options_plist(
            profile.method.as_str(),
            &profile.team_id,
            &profile.signing_identity,
            &profile.bundle_id,
            &profile.name,
        );
        fs::write(self.export_options_path(), plist).with_context(|| {
            format!(
                "Failed to write export options: {}",
                self.export_options_path().display()
            )
        })?;

        run_checked(runner, &self.export_command()).context("xcodebuild -exportArchive failed")?;

        Self::relocate(&self.exported_ipa(), &self.package_path())?;
        if let Some(archive_file) = &self.options.archive_file {
            Self::relocate(&self.archive_path(), archive_file)?;
            println!(
                "{} Archive saved to: {}",
                "[INFO]".cyan(),
                archive_file.display()
            );
        }
        Ok(())
    }

    fn find_output(&self) -> Result<Vec<PathBuf>> {
        let package = self.package_path();
        Ok(if package.exists() { vec![package] } else { Vec::new() })
    }
}
