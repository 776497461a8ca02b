use clap::Args;
use colored::Colorize;
use dora_common::error::Result;
use dora_common::model::Connection;
use prettytable::{format, Cell, Row, Table};

use crate::cli::Session;

#[derive(Args, Debug)]
pub struct List;

impl List {
    pub async fn run(&self, session: &Session) -> Result<()> {
        let client = session.client()?;
        let addons = match client.connection().await? {
            Connection::Disconnected => {
                let host = client.endpoint()?;
                println!("{}", format!("Not connected to {host}").yellow());
                return Ok(());
            }
            Connection::Connected(addons) => addons,
        };
        if addons.is_empty() {
            println!("{}", "0 addons on device".yellow());
            return Ok(());
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.add_row(Row::new(vec![
            Cell::new("Id").style_spec("b"),
            Cell::new("Name").style_spec("b"),
            Cell::new("UUID").style_spec("b"),
            Cell::new("Version").style_spec("b"),
            Cell::new("Author").style_spec("b"),
        ]));
        for addon in &addons {
            table.add_row(Row::new(vec![
                Cell::new(&addon.id.to_string()),
                Cell::new(&addon.display_name).style_spec("Fb"),
                Cell::new(&addon.uuid),
                Cell::new(&addon.version),
                Cell::new(&addon.author),
            ]));
        }
        table.printstd();
        println!("{}", format!("{} addons on device", addons.len()).bold());
        Ok(())
    }
}
