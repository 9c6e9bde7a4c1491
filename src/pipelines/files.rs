use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use crate::fsops;

pub fn execute_copy_pipeline(src: &Path, dst: &Path, append: bool, preserve_metadata: bool) -> Result<()> {
    fsops::copy(src, dst, append, preserve_metadata)
        .with_context(|| format!("Failed to copy {}", src.display()))?;
    println!(
        "{} Copied {} -> {}",
        "[DONE]".green().bold(),
        src.display(),
        dst.display()
    );
    Ok(())
}

pub fn execute_delete_pipeline(path: &Path, suffixes: &[String]) -> Result<()> {
    let suffixes: Vec<&str> = suffixes.iter().map(String::as_str).collect();
    fsops::delete(path, &suffixes).with_context(|| format!("Failed to delete {}", path.display()))?;
    println!("{} Deleted {}", "[DONE]".green().bold(), path.display());
    Ok(())
}
