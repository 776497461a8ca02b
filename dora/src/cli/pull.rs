use std::env;
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use dora_common::error::Result;
use dora_core::PullOutcome;
use tracing::instrument;

use crate::cli::push::active_file_for;
use crate::cli::Session;
use crate::terminal::TerminalUi;

#[derive(Args, Debug)]
pub struct Pull {
    /// Addon to download; defaults to the addon of the project in the current directory
    pub uuid: Option<String>,

    /// Extract here instead of asking
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Accept the default destination and overwrite without asking
    #[arg(long, short)]
    pub yes: bool,
}

impl Pull {
    #[instrument(skip(session))]
    pub async fn run(&self, session: &Session) -> Result<()> {
        let cwd = env::current_dir()?;
        let active = match self.uuid {
            Some(_) => None,
            None => Some(active_file_for(&cwd)?),
        };
        let ui = TerminalUi {
            destination: self.dest.clone(),
            assume_yes: self.yes,
            ..TerminalUi::new(active, Some(cwd))
        };
        let orchestrator = session.orchestrator(ui)?;

        let outcome = match &self.uuid {
            Some(uuid) => orchestrator.pull_by_uuid(uuid).await?,
            None => orchestrator.pull_workspace().await?,
        };
        match outcome {
            PullOutcome::Completed {
                destination, files, ..
            } => println!(
                "{}",
                format!("{} files written to {}", files, destination.display()).dimmed()
            ),
            PullOutcome::Cancelled => println!("{}", "Pull cancelled".yellow()),
        }
        Ok(())
    }
}
