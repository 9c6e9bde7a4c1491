use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;
use crate::invoker::DEFAULT_DISPATCHER;

/// Default name of the optional configuration file.
pub const CONFIG_FILE_NAME: &str = "buildutil.toml";

/// Contents of `buildutil.toml`. Every section is optional.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct FileConfig {
    pub unity: Option<UnityConfig>,
    pub android: Option<AndroidConfig>,
}

/// `[unity]` section.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UnityConfig {
    /// Editor installation directory, used when neither `--unity-home`
    /// nor `UNITY_HOME` is set.
    pub home: Option<PathBuf>,

    /// Editor log file passed as `-logFile`.
    pub log: Option<PathBuf>,

    /// Directory containing the helper scripts injected into projects.
    pub scripts_dir: Option<PathBuf>,

    /// Static method the editor runs to dispatch chained calls.
    pub dispatcher: Option<String>,

    pub batchmode: Option<bool>,
    pub quit: Option<bool>,
}

/// `[android]` section.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct AndroidConfig {
    /// Directory holding `gradlew` / `gradlew.bat`.
    pub gradle_home: Option<PathBuf>,
}

/// Loads `path`, or the default config file from the working directory.
///
/// A missing default file yields an empty config. An explicitly requested
/// file must exist.
pub fn load(path: Option<&Path>) -> Result<FileConfig> {
    let (config_path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(CONFIG_FILE_NAME), false),
    };

    if !config_path.exists() {
        if required {
            anyhow::bail!("Configuration file not found: {}", config_path.display());
        }
        return Ok(FileConfig::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;

    toml::from_str(&content).with_context(|| format!("Failed to parse {}", config_path.display()))
}

/// Settings resolved once at startup and passed explicitly to every pipeline.
#[derive(Debug, Clone)]
pub struct Settings {
    pub unity_home: Option<PathBuf>,
    pub unity_log: Option<PathBuf>,
    pub switch_target: Option<String>,
    pub batch_mode: bool,
    pub quit: bool,
    pub scripts_dir: PathBuf,
    pub dispatcher: String,
    pub gradle_home: PathBuf,
}

impl Settings {
    /// Merges CLI flags over file config over built-in defaults.
    ///
    /// `install_dir` is where the tool itself lives; bundled helper scripts
    /// and the gradle wrapper are looked up relative to it by default.
    pub fn resolve(args: &GlobalArgs, file: FileConfig, install_dir: &Path) -> Self {
        let unity = file.unity.unwrap_or_default();
        let android = file.android.unwrap_or_default();

        Self {
            unity_home: args.unity_home.clone().or(unity.home),
            unity_log: args.unity_log.clone().or(unity.log),
            switch_target: args.switch_target.map(|t| t.editor_name().to_string()),
            batch_mode: !args.no_batch && unity.batchmode.unwrap_or(true),
            quit: !args.no_quit && unity.quit.unwrap_or(true),
            scripts_dir: args
                .scripts_dir
                .clone()
                .or(unity.scripts_dir)
                .unwrap_or_else(|| install_dir.join("EditorScripts")),
            dispatcher: unity
                .dispatcher
                .unwrap_or_else(|| DEFAULT_DISPATCHER.to_string()),
            gradle_home: args
                .gradle_home
                .clone()
                .or(android.gradle_home)
                .unwrap_or_else(|| install_dir.join("gradlew")),
        }
    }
}
