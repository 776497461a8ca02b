// dora/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use dora_common::artifact::ArtifactTracker;
use dora_common::config::{ConfigSource, ConfigStore};
use dora_common::error::Result;
use dora_core::sync::SyncOrchestrator;
use dora_net::RemoteClient;

pub mod config;
pub mod host;
pub mod list;
pub mod ping;
pub mod pull;
pub mod push;
pub mod watch;

use crate::cli::config::ConfigArgs;
use crate::cli::host::Host;
use crate::cli::list::List;
use crate::cli::ping::Ping;
use crate::cli::pull::Pull;
use crate::cli::push::Push;
use crate::cli::watch::Watch;
use crate::terminal::TerminalUi;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "dora", bin_name = "dora")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Ping(Ping),
    Host(Host),
    Config(ConfigArgs),
    List(List),
    Pull(Pull),
    Push(Push),
    Watch(Watch),
}

impl Command {
    pub async fn run(&self, session: &Session) -> Result<()> {
        match self {
            Self::Ping(command) => command.run(session).await,
            Self::Host(command) => command.run(session).await,
            Self::Config(command) => command.run(session),
            Self::List(command) => command.run(session).await,
            Self::Pull(command) => command.run(session).await,
            Self::Push(command) => command.run(session).await,
            Self::Watch(command) => command.run(session).await,
        }
    }
}

/// Process-wide state shared by every command.
pub struct Session {
    pub store: ConfigStore,
    pub artifacts: ArtifactTracker,
}

impl Session {
    /// Reads the config file on every access, so edits made while `watch` runs apply.
    pub fn config_source(&self) -> Arc<dyn ConfigSource> {
        Arc::new(self.store.clone())
    }

    pub fn client(&self) -> Result<RemoteClient> {
        RemoteClient::new(self.config_source())
    }

    pub fn orchestrator(&self, ui: TerminalUi) -> Result<SyncOrchestrator<TerminalUi>> {
        let config = self.config_source();
        Ok(SyncOrchestrator::new(
            RemoteClient::new(config.clone())?,
            config,
            ui,
            self.artifacts.clone(),
        ))
    }
}
