use clap::Args;
use colored::Colorize;
use dora_common::config::parse_switch;
use dora_common::error::Result;
use dora_core::archive::{ExcludeSet, DEFAULT_EXCLUDES};

use crate::cli::Session;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Push automatically whenever a watched file is saved
    #[arg(long, value_name = "on|off", value_parser = parse_auto_push)]
    pub auto_push: Option<bool>,

    /// Extra glob to leave out of pushed archives (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Drop all user exclusions before adding new ones
    #[arg(long)]
    pub clear_exclude: bool,
}

fn parse_auto_push(value: &str) -> std::result::Result<bool, String> {
    parse_switch(value).ok_or_else(|| format!("expected on or off, got '{value}'"))
}

impl ConfigArgs {
    pub fn run(&self, session: &Session) -> Result<()> {
        let mut config = session.store.load_file()?;
        let changing = self.auto_push.is_some() || self.clear_exclude || !self.exclude.is_empty();

        if changing {
            if let Some(auto_push) = self.auto_push {
                config.auto_push = auto_push;
            }
            if self.clear_exclude {
                config.exclude.clear();
            }
            for pattern in &self.exclude {
                if !config.exclude.contains(pattern) {
                    config.exclude.push(pattern.clone());
                }
            }
            ExcludeSet::new(&config.exclude)?;
            session.store.save(&config)?;
            println!(
                "{}",
                format!("Saved {}", session.store.config_path().display()).bold()
            );
        }

        let effective = session.store.load()?;
        println!(
            "{:<10} {}",
            "host".bold(),
            effective.host.as_deref().unwrap_or("(not set)")
        );
        println!(
            "{:<10} {}",
            "autoPush".bold(),
            if effective.auto_push { "on".green() } else { "off".yellow() }
        );
        let builtin = DEFAULT_EXCLUDES.join(", ");
        if effective.exclude.is_empty() {
            println!("{:<10} {}", "exclude".bold(), builtin.dimmed());
        } else {
            println!(
                "{:<10} {} {}",
                "exclude".bold(),
                effective.exclude.join(", "),
                format!("(+ {builtin})").dimmed()
            );
        }
        Ok(())
    }
}
