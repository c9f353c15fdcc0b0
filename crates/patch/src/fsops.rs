#![forbid(unsafe_code)]

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Replace `target` with `content` so readers see either the old or the new bytes, never a
/// partial write: write and sync a sibling temp file, then rename it over the target.
pub(crate) fn write_atomic(target: &Path, content: &str) -> std::io::Result<()> {
    let tmp = temp_sibling(target);
    let written = (|| {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&tmp, target)
    })();
    if written.is_err() {
        let _ = remove_if_exists(&tmp);
    }
    written
}

/// Returns whether something was removed.
pub(crate) fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Ancestors of `dir` (including `dir`) that do not exist yet, outermost first.
pub(crate) fn missing_dirs(dir: &Path) -> Vec<PathBuf> {
    let mut missing = Vec::new();
    let mut current = Some(dir);
    while let Some(candidate) = current {
        if candidate.as_os_str().is_empty() || std::fs::symlink_metadata(candidate).is_ok() {
            break;
        }
        missing.push(candidate.to_path_buf());
        current = candidate.parent();
    }
    missing.reverse();
    missing
}

/// Nearest ancestor of `path` (or `path` itself) that exists on disk.
pub(crate) fn nearest_existing(path: &Path) -> Option<&Path> {
    path.ancestors()
        .find(|candidate| std::fs::symlink_metadata(candidate).is_ok())
}

fn temp_sibling(target: &Path) -> PathBuf {
    let base = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "patch".to_string());
    target.with_file_name(format!("{base}.tmp-{}", uuid::Uuid::new_v4()))
}
