use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

use unity_buildutil::builder::gradle::GradleOptions;
use unity_buildutil::builder::xcode::XcodeOptions;
use unity_buildutil::cli::{Cli, Commands};
use unity_buildutil::config::{self, Settings};
use unity_buildutil::invoker::SystemRunner;
use unity_buildutil::{exit_code_of, logging, pipelines};

/// CLI entry point
///
/// - Parses arguments
/// - Catches errors and prints them without a backtrace
/// - Mirrors the exit code of a failed external tool
fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
        std::process::exit(exit_code_of(&e));
    }
}

/// Directory of the running executable; bundled resources live next to it.
fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Dispatches to the business pipelines
fn run(cli: Cli) -> Result<()> {
    logging::init(cli.global.log.as_deref(), cli.global.log_truncate)?;

    let file_config = config::load(cli.global.config.as_deref())?;
    let settings = Settings::resolve(&cli.global, file_config, &install_dir());
    let runner = SystemRunner;

    match cli.command {
        Commands::Invoke {
            project,
            method,
            args,
        } => pipelines::execute_invoke_pipeline(&settings, &runner, &project, &method, &args),

        Commands::Build {
            project,
            target,
            output,
            opt,
            export_only,
            development,
            keep_product_dir,
        } => {
            let params = pipelines::BuildParams {
                project,
                target,
                output,
                options: opt,
                export_only,
                development,
                keep_product_dir,
            };
            pipelines::execute_build_pipeline(&settings, &runner, &params).map(|_| ())
        }

        Commands::PackAndroid {
            project,
            build_file,
            task,
            var,
            pfx,
            sfx,
            prop,
            no_default_props,
        } => {
            let options = GradleOptions {
                project,
                build_file,
                tasks: task,
                variants: var,
                prefix: pfx,
                suffix: sfx,
                properties: prop,
                no_default_properties: no_default_props,
            };
            pipelines::execute_android_pipeline(&settings, &runner, options).map(|_| ())
        }

        Commands::PackIos {
            project,
            prov_file,
            out_file,
            archive_file,
            product_name,
            debug,
            target,
            sdk,
            keychain,
            opt,
            no_default_opts,
        } => {
            let keychain = match keychain.as_slice() {
                [] => None,
                [path, password] => Some((PathBuf::from(path), password.clone())),
                _ => anyhow::bail!("--keychain expects a path and a password"),
            };
            let options = XcodeOptions {
                project,
                provisioning_profile: prov_file,
                out_file,
                archive_file,
                product_name,
                debug,
                target,
                sdk,
                keychain,
                extra_settings: opt,
                no_default_settings: no_default_opts,
            };
            pipelines::execute_ios_pipeline(&runner, options).map(|_| ())
        }

        Commands::Copy {
            src,
            dst,
            append,
            stat,
        } => pipelines::execute_copy_pipeline(&src, &dst, append, stat),

        Commands::Del { path, sfx } => pipelines::execute_delete_pipeline(&path, &sfx),
    }
}
