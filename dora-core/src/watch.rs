// dora-core/src/watch.rs
//! Auto-push on save.
//!
//! Files become watched the first time they are activated (opened by the user, or
//! discovered by `tracked_files`) and stay watched for the rest of the session. Each
//! change notification re-reads `autoPush` before pushing.
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dora_common::config::ConfigSource;
use dora_common::error::{DoraError, Result};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::archive::build::archive_name;
use crate::archive::ExcludeSet;
use crate::sync::{PushReport, PushTrigger};

/// Script and manifest files.
pub const TRACKED_EXTENSIONS: &[&str] = &["js", "json"];

pub fn is_tracked(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            TRACKED_EXTENSIONS
                .iter()
                .any(|tracked| ext.eq_ignore_ascii_case(tracked))
        })
}

/// Tracked files under `root`, skipping excluded directories.
pub fn tracked_files(root: &Path, exclude: &ExcludeSet) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            archive_name(relative)
                .map(|name| !exclude.is_excluded(&name, entry.file_type().is_dir()))
                .unwrap_or(true)
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_tracked(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Source of per-file watch handles.
pub trait WatchBackend {
    type Handle;

    fn watch(&mut self, path: &Path) -> Result<Self::Handle>;
}

#[derive(Debug)]
pub enum ChangeOutcome {
    /// The path has no registration.
    NotWatched,
    AutoPushDisabled,
    Pushed(PushReport),
    Failed(DoraError),
}

pub struct ChangeWatcher<B: WatchBackend> {
    backend: B,
    config: Arc<dyn ConfigSource>,
    registrations: HashMap<PathBuf, B::Handle>,
}

impl<B: WatchBackend> ChangeWatcher<B> {
    pub fn new(backend: B, config: Arc<dyn ConfigSource>) -> Self {
        Self {
            backend,
            config,
            registrations: HashMap::new(),
        }
    }

    /// Registers a watch for `path` if it is a tracked file not yet watched.
    /// Returns whether a new registration was made.
    pub fn activate(&mut self, path: &Path) -> Result<bool> {
        if !is_tracked(path) || self.registrations.contains_key(path) {
            return Ok(false);
        }
        let handle = self.backend.watch(path)?;
        debug!("Watching {}", path.display());
        self.registrations.insert(path.to_path_buf(), handle);
        Ok(true)
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.registrations.contains_key(path)
    }

    pub fn watched_count(&self) -> usize {
        self.registrations.len()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn handle_change<T: PushTrigger + ?Sized>(
        &self,
        path: &Path,
        trigger: &T,
    ) -> ChangeOutcome {
        if !self.is_watching(path) {
            return ChangeOutcome::NotWatched;
        }
        if !self.config.auto_push() {
            debug!("{} changed, autoPush is off", path.display());
            return ChangeOutcome::AutoPushDisabled;
        }
        debug!("{} changed, pushing", path.display());
        match trigger.push_from(path).await {
            Ok(report) => ChangeOutcome::Pushed(report),
            Err(e) => ChangeOutcome::Failed(e),
        }
    }
}

/// Watches through `notify`, forwarding the changed path on `events`.
///
/// One debouncer serves every registration. Each distinct parent directory gets a single
/// non-recursive watch, and events are routed back to the registered file path.
pub struct NotifyBackend {
    debouncer: Debouncer<RecommendedWatcher>,
    routes: Arc<Mutex<HashMap<PathBuf, PathBuf>>>,
    dirs: HashSet<PathBuf>,
}

impl NotifyBackend {
    pub fn new(events: UnboundedSender<PathBuf>, debounce: Duration) -> Result<Self> {
        let routes: Arc<Mutex<HashMap<PathBuf, PathBuf>>> = Arc::default();
        let lookup = Arc::clone(&routes);
        let debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
            match result {
                Ok(changes) => {
                    let routes = lock_routes(&lookup);
                    let mut sent = HashSet::new();
                    for change in changes {
                        let Some(watched) = routes.get(&canonical_file(&change.path)) else {
                            continue;
                        };
                        if sent.insert(watched.clone()) {
                            let _ = events.send(watched.clone());
                        }
                    }
                }
                Err(e) => warn!("Watch error: {e:?}"),
            }
        })
        .map_err(|e| DoraError::Watch(format!("Failed to create file watcher: {e}")))?;
        Ok(Self {
            debouncer,
            routes,
            dirs: HashSet::new(),
        })
    }

    /// Number of directories with a live watch.
    pub fn watched_dirs(&self) -> usize {
        self.dirs.len()
    }
}

impl WatchBackend for NotifyBackend {
    type Handle = ();

    // Watches the parent directory so editors that save by renaming over the file
    // keep being noticed.
    fn watch(&mut self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| DoraError::Watch(format!("{} has no parent", path.display())))?;
        let file_name = path
            .file_name()
            .ok_or_else(|| DoraError::Watch(format!("{} is not a file", path.display())))?;
        let dir = fs::canonicalize(parent).unwrap_or_else(|_| parent.to_path_buf());

        if !self.dirs.contains(&dir) {
            self.debouncer
                .watcher()
                .watch(&dir, RecursiveMode::NonRecursive)
                .map_err(|e| {
                    DoraError::Watch(format!("Failed to watch {}: {}", dir.display(), e))
                })?;
            debug!("Watching directory {}", dir.display());
            self.dirs.insert(dir.clone());
        }
        lock_routes(&self.routes).insert(dir.join(file_name), path.to_path_buf());
        Ok(())
    }
}

// Event paths are resolved the same way registrations are, so symlinked temp dirs match.
fn canonical_file(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .unwrap_or_else(|_| parent.to_path_buf())
            .join(name),
        _ => path.to_path_buf(),
    }
}

fn lock_routes(
    routes: &Mutex<HashMap<PathBuf, PathBuf>>,
) -> MutexGuard<'_, HashMap<PathBuf, PathBuf>> {
    routes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
