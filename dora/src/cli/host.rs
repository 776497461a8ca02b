use clap::Args;
use colored::Colorize;
use dora_common::error::Result;
use dora_core::configure_host;
use tracing::instrument;

use crate::cli::Session;
use crate::terminal::TerminalUi;

#[derive(Args, Debug)]
pub struct Host {
    /// Device address; prompts for one when omitted
    pub host: Option<String>,
}

impl Host {
    #[instrument(skip(session))]
    pub async fn run(&self, session: &Session) -> Result<()> {
        let client = session.client()?;
        let ui = TerminalUi::default();
        let saved = configure_host(&client, &ui, &session.store, self.host.clone()).await?;
        if saved.is_none() {
            println!("{}", "Host unchanged".yellow());
        }
        Ok(())
    }
}
