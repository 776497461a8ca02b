// dora-core/src/ui.rs
use std::path::{Path, PathBuf};

use dora_common::model::Addon;

/// Everything the sync workflows need from whoever is driving them.
///
/// Prompts return `None`/`false` when the user declines; the workflows treat that as a
/// silent cancel, not an error.
pub trait UserInterface: Send + Sync {
    /// File the user is currently editing.
    fn active_file(&self) -> Option<PathBuf>;

    /// Root of the folder the user has open, if any.
    fn workspace_root(&self) -> Option<PathBuf>;

    fn select_destination(&self, addon: &Addon, default: &Path) -> Option<PathBuf>;

    fn confirm_overwrite(&self, destination: &Path) -> bool;

    /// Free-text host entry, pre-filled with `current`.
    fn request_host(&self, current: Option<&str>) -> Option<String>;

    fn show_info(&self, message: &str);

    fn show_error(&self, message: &str);
}
