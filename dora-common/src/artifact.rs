// dora-common/src/artifact.rs
//! Temporary archive files created by push and pull.
//!
//! Each `TempArtifact` is owned by the operation that created it and removes its file
//! exactly once: on `delete`, or on drop if the operation bailed out early. The shared
//! `ArtifactTracker` remembers every artifact still on disk so that shutdown can sweep
//! whatever a killed operation left behind.
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::error::{DoraError, Result};

#[derive(Debug, Clone, Default)]
pub struct ArtifactTracker {
    live: Arc<Mutex<HashSet<PathBuf>>>,
}

impl ArtifactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a uniquely named empty file in the system temp dir.
    pub fn create(&self, prefix: &str) -> Result<TempArtifact> {
        self.create_in(&std::env::temp_dir(), prefix)
    }

    pub fn create_in(&self, dir: &Path, prefix: &str) -> Result<TempArtifact> {
        let temp_path = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".zip")
            .tempfile_in(dir)?
            .into_temp_path();
        let path = temp_path.keep().map_err(|e| DoraError::from(e.error))?;
        debug!("Allocated temp artifact {}", path.display());
        self.lock().insert(path.clone());
        Ok(TempArtifact {
            path,
            tracker: self.clone(),
            deleted: false,
        })
    }

    /// Paths of artifacts that have not been deleted yet.
    pub fn live(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.lock().iter().cloned().collect();
        paths.sort();
        paths
    }

    /// Best-effort removal of every artifact still on disk. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let paths: Vec<PathBuf> = self.lock().drain().collect();
        let mut removed = 0;
        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Swept leftover artifact {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to sweep artifact {}: {}", path.display(), e),
            }
        }
        removed
    }

    fn forget(&self, path: &Path) {
        self.lock().remove(path);
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    tracker: ArtifactTracker,
    deleted: bool,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the file now, reporting failure to the caller.
    pub fn delete(mut self) -> Result<()> {
        self.remove().map_err(DoraError::from)
    }

    fn remove(&mut self) -> io::Result<()> {
        if self.deleted {
            return Ok(());
        }
        self.deleted = true;
        self.tracker.forget(&self.path);
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Deleted temp artifact {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            warn!(
                "Failed to delete temp artifact {}: {}",
                self.path.display(),
                e
            );
        }
    }
}
