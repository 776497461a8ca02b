// dora-core/src/sync.rs
//! Push and pull workflows.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use directories::UserDirs;
use dora_common::artifact::ArtifactTracker;
use dora_common::config::ConfigSource;
use dora_common::error::{DoraError, Result};
use dora_common::model::{Addon, Connection, Manifest, OperationResult};
use dora_net::RemoteClient;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::archive::{build_archive, extract_archive, ExcludeSet};
use crate::project;
use crate::ui::UserInterface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LocatingRoot,
    Building,
    Uploading,
    CheckingHost,
    AwaitingDestination,
    CheckingOverwrite,
    Downloading,
    Extracting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushReport {
    pub root: PathBuf,
    pub result: OperationResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PullOutcome {
    Completed {
        addon: Addon,
        destination: PathBuf,
        files: usize,
    },
    /// The user declined the destination or overwrite prompt.
    Cancelled,
}

pub struct SyncOrchestrator<U: UserInterface> {
    client: RemoteClient,
    config: Arc<dyn ConfigSource>,
    ui: U,
    artifacts: ArtifactTracker,
    push_gate: Mutex<()>,
    pull_gate: Mutex<()>,
}

impl<U: UserInterface> SyncOrchestrator<U> {
    pub fn new(
        client: RemoteClient,
        config: Arc<dyn ConfigSource>,
        ui: U,
        artifacts: ArtifactTracker,
    ) -> Self {
        Self {
            client,
            config,
            ui,
            artifacts,
            push_gate: Mutex::new(()),
            pull_gate: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &RemoteClient {
        &self.client
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn artifacts(&self) -> &ArtifactTracker {
        &self.artifacts
    }

    /// Pushes the project containing the UI's active file.
    pub async fn push(&self) -> Result<PushReport> {
        let active = self.ui.active_file().ok_or(DoraError::NoActiveFile)?;
        self.push_from(&active).await
    }

    #[instrument(skip(self))]
    pub async fn push_from(&self, active_file: &Path) -> Result<PushReport> {
        let _guard = self
            .push_gate
            .try_lock()
            .map_err(|_| DoraError::Busy("push"))?;
        self.client.endpoint()?;

        debug!(stage = ?Stage::LocatingRoot, "push");
        let root = project::find_project_root(active_file)?;

        debug!(stage = ?Stage::Building, root = %root.display(), "push");
        let exclude = ExcludeSet::new(&self.config.exclude())?;
        let artifacts = self.artifacts.clone();
        let source = root.clone();
        let artifact = tokio::task::spawn_blocking(move || {
            build_archive(&source, &exclude, &artifacts)
        })
        .await
        .map_err(|e| DoraError::Build(format!("Archive task failed: {e}")))??;

        debug!(stage = ?Stage::Uploading, archive = %artifact.path().display(), "push");
        let upload = self.client.upload_addon(artifact.path()).await;
        if let Err(e) = artifact.delete() {
            warn!("Failed to delete pushed archive: {e}");
        }
        let result = upload?;

        info!("Pushed {}: {}", root.display(), result);
        self.ui
            .show_info(&format!("Pushed {} ({})", root.display(), result));
        Ok(PushReport { root, result })
    }

    /// Pulls `addon` into a directory chosen through the UI.
    pub async fn pull(&self, addon: &Addon) -> Result<PullOutcome> {
        let default = self.default_destination();
        self.pull_with_default(addon, &default).await
    }

    /// Looks `uuid` up on the device, then pulls it.
    pub async fn pull_by_uuid(&self, uuid: &str) -> Result<PullOutcome> {
        let addon = self.resolve_addon(uuid).await?;
        self.pull(&addon).await
    }

    /// Pulls the addon named by the active project's manifest back into that project.
    pub async fn pull_workspace(&self) -> Result<PullOutcome> {
        let active = self.ui.active_file().ok_or(DoraError::NoActiveFile)?;
        let root = project::find_project_root(&active)?;
        let manifest = Manifest::load(&root)?;
        debug!(
            "Workspace {} is addon {} ({})",
            root.display(),
            manifest.uuid,
            manifest.label()
        );
        let addon = self.resolve_addon(&manifest.uuid).await?;
        self.pull_with_default(&addon, &root).await
    }

    async fn resolve_addon(&self, uuid: &str) -> Result<Addon> {
        let host = self.host_label()?;
        match self.client.connection().await? {
            Connection::Disconnected => Err(DoraError::HostUnavailable(host)),
            connection @ Connection::Connected(_) => connection
                .find(uuid)
                .cloned()
                .ok_or_else(|| DoraError::NotFound(format!("No addon with uuid {uuid} on {host}"))),
        }
    }

    #[instrument(skip(self, addon), fields(uuid = %addon.uuid))]
    async fn pull_with_default(&self, addon: &Addon, default: &Path) -> Result<PullOutcome> {
        let _guard = self
            .pull_gate
            .try_lock()
            .map_err(|_| DoraError::Busy("pull"))?;
        let host = self.host_label()?;

        debug!(stage = ?Stage::CheckingHost, "pull");
        if !self.client.is_reachable().await {
            return Err(DoraError::HostUnavailable(host));
        }

        debug!(stage = ?Stage::AwaitingDestination, "pull");
        let Some(destination) = self.ui.select_destination(addon, default) else {
            debug!("Pull cancelled: no destination selected");
            return Ok(PullOutcome::Cancelled);
        };

        debug!(stage = ?Stage::CheckingOverwrite, destination = %destination.display(), "pull");
        if !is_dir_empty(&destination)? && !self.ui.confirm_overwrite(&destination) {
            debug!("Pull cancelled: overwrite of {} declined", destination.display());
            return Ok(PullOutcome::Cancelled);
        }

        debug!(stage = ?Stage::Downloading, "pull");
        let artifact = self
            .client
            .download_addon(&addon.uuid, &self.artifacts)
            .await?;

        debug!(stage = ?Stage::Extracting, "pull");
        let archive = artifact.path().to_path_buf();
        let target = destination.clone();
        let extracted =
            tokio::task::spawn_blocking(move || extract_archive(&archive, &target)).await;
        if let Err(e) = artifact.delete() {
            warn!("Failed to delete pulled archive: {e}");
        }
        let files = extracted
            .map_err(|e| DoraError::Extraction(format!("Extraction task failed: {e}")))??;

        info!(
            "Pulled {} into {} ({} files)",
            addon.display_name,
            destination.display(),
            files
        );
        self.ui
            .show_info(&format!("Downloaded {}!", addon.display_name));
        Ok(PullOutcome::Completed {
            addon: addon.clone(),
            destination,
            files,
        })
    }

    fn host_label(&self) -> Result<String> {
        self.client.endpoint()?;
        Ok(self.config.host().unwrap_or_default())
    }

    fn default_destination(&self) -> PathBuf {
        self.ui
            .workspace_root()
            .or_else(|| UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Lets the change watcher trigger a push without knowing the UI type.
#[async_trait]
pub trait PushTrigger: Send + Sync {
    async fn push_from(&self, active_file: &Path) -> Result<PushReport>;
}

#[async_trait]
impl<U: UserInterface> PushTrigger for SyncOrchestrator<U> {
    async fn push_from(&self, active_file: &Path) -> Result<PushReport> {
        SyncOrchestrator::push_from(self, active_file).await
    }
}

/// A missing destination counts as empty; extraction creates it.
fn is_dir_empty(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(true);
    }
    if !dir.is_dir() {
        return Err(DoraError::Validation(format!(
            "Destination {} is not a directory",
            dir.display()
        )));
    }
    Ok(fs::read_dir(dir)?.next().is_none())
}
