// dora/src/main.rs
use std::fs;
use std::process;

use clap::Parser;
use colored::Colorize;
use dora_common::artifact::ArtifactTracker;
use dora_common::config::ConfigStore;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

mod cli;
mod terminal;

use cli::{CliArgs, Session};

fn init_logging(store: &ConfigStore, verbose: u8) {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let max_log_level = level_filter.into_level().unwrap_or(tracing::Level::INFO);

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("DORA_LOG")
        .from_env_lossy();

    if verbose == 0 {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .without_time()
            .try_init();
        return;
    }

    let log_dir = store.logs_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!(
            "{} Failed to create log directory {}: {}",
            "Error:".red().bold(),
            log_dir.display(),
            e
        );
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .without_time()
            .try_init();
        return;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "dora.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);
    let stderr_writer = std::io::stderr.with_max_level(max_log_level);
    let file_writer = non_blocking_appender.with_max_level(max_log_level);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr_writer.and(file_writer))
        .with_ansi(true)
        .without_time()
        .try_init();

    // The file writer flushes on drop, so the guard lives for the whole process.
    Box::leak(Box::new(guard));

    debug!(
        "Verbose logging enabled. Writing logs to: {}/dora.log",
        log_dir.display()
    );
}

#[tokio::main]
async fn main() {
    let cli_args = CliArgs::parse();

    let store = match ConfigStore::open() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            process::exit(1);
        }
    };
    init_logging(&store, cli_args.verbose);

    let session = Session {
        store,
        artifacts: ArtifactTracker::new(),
    };
    let result = cli_args.command.run(&session).await;

    let swept = session.artifacts.sweep();
    if swept > 0 {
        debug!("Removed {swept} leftover temporary archive(s)");
    }

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        eprintln!("{}: {}", "Error".red().bold(), e.user_message());
        process::exit(1);
    }

    debug!("Command completed successfully.");
}
