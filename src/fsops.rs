//! Recursive copy and delete helpers used around editor invocations.

use std::ffi::OsString;
use std::fs::{self, FileTimes};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::BuildError;

/// Copies a file or directory tree from `src` to `dst`.
///
/// # Behavior
/// - Fails if `src` is missing or is the same path as `dst`.
/// - A directory copy replaces `dst` wholesale unless `append` is set, in
///   which case the trees are merged and existing files are overwritten.
/// - `preserve_metadata` carries access and modification times over to
///   copied files. Permission bits are always copied.
pub fn copy(src: &Path, dst: &Path, append: bool, preserve_metadata: bool) -> Result<(), BuildError> {
    if !src.exists() || same_path(src, dst) {
        return Err(BuildError::file_op("copy", src, dst, None));
    }
    copy_inner(src, dst, append, preserve_metadata)
}

fn copy_inner(src: &Path, dst: &Path, append: bool, preserve_metadata: bool) -> Result<(), BuildError> {
    let io_err = |e: std::io::Error| BuildError::file_op("copy", src, dst, Some(e));

    if src.is_file() {
        return copy_file(src, dst, preserve_metadata);
    }
    if !src.is_dir() {
        warn!(path = %src.display(), "path is not a file or directory, skipped");
        return Ok(());
    }

    if dst.is_dir() {
        if !append {
            fs::remove_dir_all(dst).map_err(io_err)?;
        }
    } else if dst.exists() {
        fs::remove_file(dst).map_err(io_err)?;
    }
    fs::create_dir_all(dst).map_err(io_err)?;

    for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| BuildError::file_op("copy", src, dst, e.into_io_error()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| BuildError::file_op("copy", entry.path(), dst, None))?;
        let out = dst.join(rel);

        if entry.file_type().is_dir() {
            if out.exists() && !out.is_dir() {
                fs::remove_file(&out).map_err(io_err)?;
            }
            fs::create_dir_all(&out).map_err(io_err)?;
        } else if entry.file_type().is_file() {
            copy_file(entry.path(), &out, preserve_metadata)?;
        } else {
            warn!(path = %entry.path().display(), "path is not a file or directory, skipped");
        }
    }

    Ok(())
}

fn copy_file(src: &Path, dst: &Path, preserve_metadata: bool) -> Result<(), BuildError> {
    let io_err = |e: std::io::Error| BuildError::file_op("copy", src, dst, Some(e));

    if dst.exists() {
        delete(dst, &[])?;
    } else if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    fs::copy(src, dst).map_err(io_err)?;
    if preserve_metadata {
        copy_times(src, dst).map_err(io_err)?;
    }
    Ok(())
}

fn copy_times(src: &Path, dst: &Path) -> std::io::Result<()> {
    let meta = fs::metadata(src)?;
    let times = FileTimes::new()
        .set_accessed(meta.accessed()?)
        .set_modified(meta.modified()?);
    fs::File::options().write(true).open(dst)?.set_times(times)
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Deletes a file or directory tree, then `path + suffix` for each suffix.
///
/// A nonexistent path is a no-op. Suffix siblings are used for the `.meta`
/// files the editor keeps next to every asset.
pub fn delete(path: &Path, also_delete_suffixes: &[&str]) -> Result<(), BuildError> {
    let io_err = |e: std::io::Error| BuildError::file_op("delete", path, path, Some(e));

    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            debug!(path = %path.display(), "removing directory");
            fs::remove_dir_all(path).map_err(io_err)?;
        }
        Ok(_) => {
            debug!(path = %path.display(), "removing file");
            fs::remove_file(path).map_err(io_err)?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(e)),
    }

    for suffix in also_delete_suffixes {
        delete(&with_suffix(path, suffix), &[])?;
    }
    Ok(())
}

/// Appends `suffix` to the final path component (`Foo` -> `Foo.meta`).
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}
