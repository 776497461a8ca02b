use std::path::{Path, PathBuf};

use clap::Args;
use dora_common::config::MANIFEST_FILENAME;
use dora_common::error::Result;
use dora_core::find_project_root_from_dir;
use tracing::instrument;

use crate::cli::Session;
use crate::terminal::TerminalUi;

#[derive(Args, Debug)]
pub struct Push {
    /// File or directory inside the project; defaults to the current directory
    pub path: Option<PathBuf>,
}

impl Push {
    #[instrument(skip(session))]
    pub async fn run(&self, session: &Session) -> Result<()> {
        let target = self.path.clone().unwrap_or_else(|| PathBuf::from("."));
        let active = active_file_for(&target)?;
        let orchestrator = session.orchestrator(TerminalUi::new(Some(active), None))?;
        orchestrator.push().await?;
        Ok(())
    }
}

/// The project search starts at an active file's parent, so a directory stands in for
/// its project's manifest.
pub(crate) fn active_file_for(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        Ok(find_project_root_from_dir(path)?.join(MANIFEST_FILENAME))
    } else {
        Ok(path.to_path_buf())
    }
}
