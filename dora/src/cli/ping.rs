use clap::Args;
use colored::Colorize;
use dora_common::config::validate_host;
use dora_common::error::{DoraError, Result};

use crate::cli::Session;

#[derive(Args, Debug)]
pub struct Ping {
    /// Address to ping instead of the configured host
    pub host: Option<String>,
}

impl Ping {
    pub async fn run(&self, session: &Session) -> Result<()> {
        let client = session.client()?;
        let (host, reachable) = match &self.host {
            Some(raw) => {
                let host = validate_host(raw)?;
                let reachable = client.is_host_reachable(&host).await;
                (host, reachable)
            }
            None => {
                let endpoint = client.endpoint()?;
                (endpoint, client.is_reachable().await)
            }
        };
        if !reachable {
            return Err(DoraError::HostUnavailable(host));
        }
        println!("{} {}", "pong".green().bold(), format!("from {host}").dimmed());
        Ok(())
    }
}
