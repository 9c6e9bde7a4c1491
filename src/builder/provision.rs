//! Provisioning profile inspection for iOS packaging.
//!
//! The profile is a CMS-signed plist. `security cms -D` decodes it and
//! `plutil -extract` reads single keys, so no plist parser is needed here.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::warn;

use crate::invoker::{CommandLine, ProcessRunner};

/// Export method written into the export-options plist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMethod {
    /// Valid on all devices, distribution profile.
    Enterprise,
    /// Valid on a limited device list, development profile.
    Development,
    /// Only valid for App Store upload.
    AppStore,
}

impl ExportMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportMethod::Enterprise => "enterprise",
            ExportMethod::Development => "development",
            ExportMethod::AppStore => "app-store",
        }
    }
}

/// Raw values read out of a decoded profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub name: Option<String>,
    pub uuid: Option<String>,
    pub team_name: Option<String>,
    pub team_id: Option<String>,
    pub application_identifier: Option<String>,
    pub provisions_all_devices: bool,
    pub has_device_list: bool,
}

/// Signing details derived from a provisioning profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningProfile {
    pub method: ExportMethod,
    pub team_id: String,
    pub signing_identity: String,
    pub bundle_id: String,
    pub name: String,
    pub uuid: String,
    /// Last component of the bundle id, used when no product name is given.
    pub default_product_name: String,
}

impl ProvisioningProfile {
    pub fn from_fields(fields: ProfileFields) -> Result<Self> {
        let method = if fields.provisions_all_devices {
            ExportMethod::Enterprise
        } else if fields.has_device_list {
            ExportMethod::Development
        } else {
            ExportMethod::AppStore
        };

        let uuid = fields.uuid.context("Provisioning profile has no UUID")?;
        let name = fields.name.context("Provisioning profile has no Name")?;
        let team_id = fields
            .team_id
            .context("Provisioning profile has no TeamIdentifier")?;
        let app_id = fields
            .application_identifier
            .context("Provisioning profile has no application-identifier entitlement")?;

        let bundle_id = app_id
            .strip_prefix(&format!("{team_id}."))
            .unwrap_or(&app_id)
            .to_string();
        let default_product_name = bundle_id.rsplit('.').next().unwrap_or_default().to_string();

        let signing_identity = match method {
            ExportMethod::Development => "iPhone Developer".to_string(),
            _ => format!(
                "iPhone Distribution: {}",
                fields.team_name.as_deref().unwrap_or_default()
            ),
        };

        Ok(Self {
            method,
            team_id,
            signing_identity,
            bundle_id,
            name,
            uuid,
            default_product_name,
        })
    }
}

/// Decodes `profile` and reads the signing details out of it.
pub fn inspect(runner: &dyn ProcessRunner, profile: &Path) -> Result<ProvisioningProfile> {
    let decode = CommandLine::new("security")
        .args(["cms", "-D", "-i"])
        .arg(profile);
    let decoded = runner
        .capture(&decode)
        .context("Failed to run `security cms`")?;
    if decoded.exit_code != 0 {
        anyhow::bail!(
            "Failed to decode provisioning profile: {} (exit code {})",
            profile.display(),
            decoded.exit_code
        );
    }

    let stem = profile
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profile".to_string());
    let mut plist = tempfile::Builder::new()
        .prefix(&format!("{stem}-"))
        .suffix(".plist")
        .tempfile()
        .context("Failed to create a temporary plist")?;
    plist
        .write_all(&decoded.stdout)
        .with_context(|| format!("Failed to write {}", plist.path().display()))?;

    let fields = read_fields(runner, plist.path());
    let plist_path = plist.path().to_path_buf();
    if let Err(e) = plist.close() {
        warn!(path = %plist_path.display(), error = %e, "unable to remove decoded profile");
    }

    ProvisioningProfile::from_fields(fields?)
        .with_context(|| format!("Invalid provisioning profile: {}", profile.display()))
}

fn read_fields(runner: &dyn ProcessRunner, plist: &Path) -> Result<ProfileFields> {
    Ok(ProfileFields {
        name: extract(runner, plist, "Name", "raw")?,
        uuid: extract(runner, plist, "UUID", "raw")?,
        team_name: extract(runner, plist, "TeamName", "raw")?,
        team_id: extract(runner, plist, "TeamIdentifier.0", "raw")?,
        application_identifier: extract(runner, plist, "Entitlements.application-identifier", "raw")?,
        provisions_all_devices: extract(runner, plist, "ProvisionsAllDevices", "raw")?
            .is_some_and(|v| v == "true"),
        has_device_list: extract(runner, plist, "ProvisionedDevices", "xml1")?.is_some(),
    })
}

/// Value at `key`, or `None` when the key is absent.
fn extract(runner: &dyn ProcessRunner, plist: &Path, key: &str, format: &str) -> Result<Option<String>> {
    let cmd = CommandLine::new("plutil")
        .args(["-extract", key, format, "-o", "-"])
        .arg(plist);
    let output = runner
        .capture(&cmd)
        .context("Failed to run `plutil`")?;
    if output.exit_code != 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
}
