// dora-core/src/project.rs
//! Finds the addon project an edited file belongs to.
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dora_common::config::MANIFEST_FILENAME;
use dora_common::error::{DoraError, Result};
use tracing::debug;

/// Nearest ancestor of `active_file` (starting at its parent) holding the manifest.
pub fn find_project_root(active_file: &Path) -> Result<PathBuf> {
    let absolute = absolutize(active_file)?;
    match absolute.parent() {
        Some(parent) => walk_up(parent, &absolute),
        None => Err(DoraError::NotAProject(absolute.clone())),
    }
}

/// Same walk, but `dir` itself is the first candidate.
pub fn find_project_root_from_dir(dir: &Path) -> Result<PathBuf> {
    let absolute = absolutize(dir)?;
    walk_up(&absolute, &absolute)
}

// The filesystem root itself is never treated as a project.
fn walk_up(start: &Path, origin: &Path) -> Result<PathBuf> {
    let mut current = start;
    while let Some(parent) = current.parent() {
        if contains_manifest(current) {
            debug!(
                "Project root for {} is {}",
                origin.display(),
                current.display()
            );
            return Ok(current.to_path_buf());
        }
        current = parent;
    }
    Err(DoraError::NotAProject(origin.to_path_buf()))
}

fn contains_manifest(dir: &Path) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list {}: {}", dir.display(), e);
            return false;
        }
    };
    entries
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.file_name() == MANIFEST_FILENAME)
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}
