// dora/src/terminal.rs
//! Prompts and messages on the controlling terminal.
use std::path::{Path, PathBuf};

use colored::Colorize;
use dialoguer::{Confirm, Input};
use dora_common::model::Addon;
use dora_core::ui::UserInterface;
use tracing::debug;

/// Terminal side of the sync workflows.
///
/// `destination` and `assume_yes` let a command line answer the prompts up front.
#[derive(Debug, Default)]
pub struct TerminalUi {
    pub active: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    pub assume_yes: bool,
}

impl TerminalUi {
    pub fn new(active: Option<PathBuf>, workspace: Option<PathBuf>) -> Self {
        Self {
            active,
            workspace,
            ..Self::default()
        }
    }
}

impl UserInterface for TerminalUi {
    fn active_file(&self) -> Option<PathBuf> {
        self.active.clone()
    }

    fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace.clone()
    }

    fn select_destination(&self, addon: &Addon, default: &Path) -> Option<PathBuf> {
        if let Some(dest) = &self.destination {
            return Some(dest.clone());
        }
        if self.assume_yes {
            return Some(default.to_path_buf());
        }
        let answer = Input::<String>::new()
            .with_prompt(format!("Download {} to", addon.display_name))
            .with_initial_text(default.display().to_string())
            .allow_empty(true)
            .interact_text();
        match answer {
            Ok(dir) if !dir.trim().is_empty() => Some(PathBuf::from(dir.trim())),
            Ok(_) => None,
            Err(e) => {
                debug!("Destination prompt closed: {e}");
                None
            }
        }
    }

    fn confirm_overwrite(&self, destination: &Path) -> bool {
        if self.assume_yes {
            return true;
        }
        Confirm::new()
            .with_prompt(format!(
                "{} is not empty, overwrite existing files?",
                destination.display()
            ))
            .default(false)
            .interact()
            .unwrap_or_else(|e| {
                debug!("Overwrite prompt closed: {e}");
                false
            })
    }

    fn request_host(&self, current: Option<&str>) -> Option<String> {
        let answer = Input::<String>::new()
            .with_prompt("Dora.js device address (e.g. 192.168.1.10)")
            .with_initial_text(current.unwrap_or_default())
            .allow_empty(true)
            .interact_text();
        match answer {
            Ok(host) if !host.trim().is_empty() => Some(host),
            Ok(_) => None,
            Err(e) => {
                debug!("Host prompt closed: {e}");
                None
            }
        }
    }

    fn show_info(&self, message: &str) {
        println!("{}{}", "==> ".bold().blue(), message.bold());
    }

    fn show_error(&self, message: &str) {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
}
