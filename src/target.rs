//! Build targets, build option sets and output path normalization.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::BuildError;

/// Option token telling the editor to export a project instead of a binary.
pub const ACCEPT_EXTERNAL_MODIFICATIONS: &str = "AcceptExternalModificationsToPlayer";
/// Option token for development builds (debug symbols, profiler).
pub const DEVELOPMENT: &str = "Development";
/// Base token used when no explicit options are given.
pub const NO_OPTIONS: &str = "None";

const OPTION_SEPARATOR: char = '|';

/// Player platform a build is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformTarget {
    Android,
    Ios,
    WindowsDesktop,
    WindowsDesktop64,
    MacDesktop,
    MacDesktop64,
}

impl PlatformTarget {
    pub const ALIASES: [&'static str; 6] = ["android", "ios", "win", "win64", "osx", "osx64"];

    /// Resolves a short user-facing alias such as `android` or `win64`.
    pub fn from_alias(alias: &str) -> Result<Self, BuildError> {
        match alias.to_ascii_lowercase().as_str() {
            "android" => Ok(PlatformTarget::Android),
            "ios" => Ok(PlatformTarget::Ios),
            "win" => Ok(PlatformTarget::WindowsDesktop),
            "win64" => Ok(PlatformTarget::WindowsDesktop64),
            "osx" => Ok(PlatformTarget::MacDesktop),
            "osx64" => Ok(PlatformTarget::MacDesktop64),
            _ => Err(BuildError::UnknownBuildTarget {
                target: alias.to_string(),
            }),
        }
    }

    /// Enum member name understood by the editor's build pipeline.
    pub fn editor_name(self) -> &'static str {
        match self {
            PlatformTarget::Android => "Android",
            PlatformTarget::Ios => "iOS",
            PlatformTarget::WindowsDesktop => "StandaloneWindows",
            PlatformTarget::WindowsDesktop64 => "StandaloneWindows64",
            PlatformTarget::MacDesktop => "StandaloneOSXIntel",
            PlatformTarget::MacDesktop64 => "StandaloneOSXIntel64",
        }
    }

    pub fn is_windows(self) -> bool {
        matches!(
            self,
            PlatformTarget::WindowsDesktop | PlatformTarget::WindowsDesktop64
        )
    }
}

impl FromStr for PlatformTarget {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformTarget::from_alias(s)
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.editor_name())
    }
}

/// Ordered, duplicate-free set of build option tokens.
///
/// Serializes as the tokens joined by `|`, which the editor side parses
/// back into a flags enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptionSet {
    tokens: Vec<String>,
}

impl BuildOptionSet {
    /// Composes an option set from an optional raw option string and the
    /// export / development flags.
    pub fn from_flags(base: Option<&str>, export_only: bool, development: bool) -> Self {
        let mut set = BuildOptionSet { tokens: Vec::new() };

        match base {
            Some(raw) if !raw.trim().is_empty() => {
                for token in raw.split(OPTION_SEPARATOR) {
                    set.insert(token.trim());
                }
            }
            _ => set.insert(NO_OPTIONS),
        }
        if export_only {
            set.insert(ACCEPT_EXTERNAL_MODIFICATIONS);
        }
        if development {
            set.insert(DEVELOPMENT);
        }
        set
    }

    fn insert(&mut self, token: &str) {
        if !token.is_empty() && !self.contains(token) {
            self.tokens.push(token.to_string());
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// True when the build exports a project for external modification.
    pub fn allows_external_modification(&self) -> bool {
        self.contains(ACCEPT_EXTERNAL_MODIFICATIONS)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn serialize(&self) -> String {
        self.tokens.join(&OPTION_SEPARATOR.to_string())
    }
}

impl fmt::Display for BuildOptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Maps a requested output path to the on-disk shape the target produces.
///
/// A path that already carries an extension is returned unchanged. Otherwise:
/// - Android gets `.apk` unless the build exports a project,
/// - iOS is left alone (the export is a directory tree),
/// - Windows becomes `<path>/bin.exe`,
/// - macOS gets `.app`.
pub fn correct_output_path(
    requested: &Path,
    target: PlatformTarget,
    options: &BuildOptionSet,
) -> PathBuf {
    // `out/..` has no file name of its own; resolve it before looking
    // for an extension so rules apply to the directory it names
    let root = normalize_lexically(requested);
    if root.extension().is_some() {
        return root;
    }

    match target {
        PlatformTarget::Android if !options.allows_external_modification() => {
            root.with_extension("apk")
        }
        PlatformTarget::Android | PlatformTarget::Ios => root,
        PlatformTarget::WindowsDesktop | PlatformTarget::WindowsDesktop64 => root.join("bin.exe"),
        PlatformTarget::MacDesktop | PlatformTarget::MacDesktop64 => root.with_extension("app"),
    }
}

/// Resolves `.` and `..` components without touching the filesystem.
///
/// A leading `.` is kept, and `..` never climbs above the root. Trailing
/// separators are dropped.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir if out.as_os_str().is_empty() => out.push("."),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                Some(Component::CurDir) => {
                    out.pop();
                    out.push("..");
                }
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `_Data` directory the Windows player writes next to its executable.
pub fn windows_data_dir(executable: &Path) -> PathBuf {
    let mut stem = executable.with_extension("").into_os_string();
    stem.push("_Data");
    PathBuf::from(stem)
}
