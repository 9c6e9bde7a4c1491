use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line interface of the build utility.
#[derive(Parser, Debug)]
#[command(author, version, about = "Build and package Unity projects from the command line")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Build log file; the parent directory is created if missing
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    /// Truncate the build log instead of appending to it
    #[arg(long, global = true, default_value_t = false)]
    pub log_truncate: bool,

    /// Configuration file (defaults to ./buildutil.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Unity installation directory
    #[arg(long, global = true, env = "UNITY_HOME")]
    pub unity_home: Option<PathBuf>,

    /// Unity editor log file, passed as -logFile
    #[arg(long, global = true)]
    pub unity_log: Option<PathBuf>,

    /// Switch the active build target before the project is loaded
    #[arg(long, global = true, value_enum)]
    pub switch_target: Option<SwitchTarget>,

    /// Run Unity without -batchmode
    #[arg(long, global = true, default_value_t = false)]
    pub no_batch: bool,

    /// Run Unity without -quit
    #[arg(long, global = true, default_value_t = false)]
    pub no_quit: bool,

    /// Directory holding the helper scripts injected into the project
    #[arg(long, global = true)]
    pub scripts_dir: Option<PathBuf>,

    /// Directory holding the gradle wrapper
    #[arg(long, global = true)]
    pub gradle_home: Option<PathBuf>,
}

/// Values accepted by Unity's -buildTarget switch.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchTarget {
    #[value(name = "Android")]
    Android,
    #[value(name = "iOS")]
    Ios,
    #[value(name = "Win")]
    Win,
    #[value(name = "Win64")]
    Win64,
    #[value(name = "OSXUniversal")]
    OsxUniversal,
}

impl SwitchTarget {
    pub fn editor_name(self) -> &'static str {
        match self {
            SwitchTarget::Android => "Android",
            SwitchTarget::Ios => "iOS",
            SwitchTarget::Win => "Win",
            SwitchTarget::Win64 => "Win64",
            SwitchTarget::OsxUniversal => "OSXUniversal",
        }
    }
}

/// All supported subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Invoke static methods of a Unity project, chained with -next
    Invoke {
        /// Unity project path
        project: PathBuf,

        /// Method to invoke: [Assembly:]Namespace.Class+Nested.Method
        method: String,

        /// Method arguments (primitive / string / enum), then optional
        /// `-next <method> <args>...` groups
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Build the player for a Unity project
    Build {
        /// Unity project path
        project: PathBuf,

        /// Build target: android, ios, win, win64, osx, osx64
        target: String,

        /// Build output path; an extension is added per target when missing
        output: PathBuf,

        /// Extra build options, `|`-separated UnityEditor.BuildOptions names
        #[arg(long)]
        opt: Option<String>,

        /// Export a project instead of building a binary (android and ios)
        #[arg(long, default_value_t = false)]
        export_only: bool,

        /// Development build with debug symbols and profiler
        #[arg(long, default_value_t = false)]
        development: bool,

        /// Keep the exported android project under <output>/<productName>/
        #[arg(long, default_value_t = false)]
        keep_product_dir: bool,
    },

    /// Package an exported android project with gradle
    #[command(name = "packandroid", alias = "pack-android")]
    PackAndroid {
        /// Exported android project path
        project: PathBuf,

        /// Build file, <project>/build.gradle by default
        #[arg(long)]
        build_file: Option<PathBuf>,

        /// Full task names to execute
        #[arg(long, num_args = 1.., conflicts_with = "var")]
        task: Vec<String>,

        /// Variants composed into {prefix}{Variant}{Suffix} task names
        #[arg(long, num_args = 1..)]
        var: Vec<String>,

        /// Task name prefix
        #[arg(long)]
        pfx: Option<String>,

        /// Task name suffix
        #[arg(long)]
        sfx: Option<String>,

        /// Additional gradle properties (key=value)
        #[arg(long, num_args = 0..)]
        prop: Vec<String>,

        /// Do not add the default targetProjDir / buildDir / archivesBaseName properties
        #[arg(long, visible_alias = "ndp", default_value_t = false)]
        no_default_props: bool,
    },

    /// Package an exported Xcode project into an .ipa
    #[command(name = "packios", alias = "pack-ios")]
    PackIos {
        /// Exported Xcode project path
        project: PathBuf,

        /// Path of the .mobileprovision file
        #[arg(long)]
        prov_file: PathBuf,

        /// Package output path, <project>.ipa by default
        #[arg(long)]
        out_file: Option<PathBuf>,

        /// Where to keep the .xcarchive (dSYM backup)
        #[arg(long)]
        archive_file: Option<PathBuf>,

        /// Product name, derived from the provisioning profile by default
        #[arg(long)]
        product_name: Option<String>,

        /// Use the Debug configuration instead of Release
        #[arg(long, default_value_t = false)]
        debug: bool,

        /// Xcode target and scheme
        #[arg(long, default_value = "Unity-iPhone")]
        target: String,

        /// SDK to build against
        #[arg(long, default_value = "iphoneos")]
        sdk: String,

        /// Keychain path and password to unlock before signing
        #[arg(long, num_args = 2, value_names = ["PATH", "PASSWORD"])]
        keychain: Vec<String>,

        /// Additional xcodebuild settings (KEY=VALUE)
        #[arg(long, num_args = 0..)]
        opt: Vec<String>,

        /// Do not add the default strip / postprocessing settings
        #[arg(long, default_value_t = false)]
        no_default_opts: bool,
    },

    /// Copy a file or directory
    Copy {
        src: PathBuf,
        dst: PathBuf,

        /// Merge into an existing destination directory instead of replacing it
        #[arg(long, default_value_t = false)]
        append: bool,

        /// Also copy access and modification times
        #[arg(long, default_value_t = false)]
        stat: bool,
    },

    /// Delete a file or directory
    Del {
        path: PathBuf,

        /// Also delete <path><suffix>, e.g. .meta
        #[arg(long, num_args = 0..)]
        sfx: Vec<String>,
    },
}
