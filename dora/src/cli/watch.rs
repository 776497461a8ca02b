use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use dora_common::config::ConfigSource;
use dora_common::error::{DoraError, Result};
use dora_core::archive::ExcludeSet;
use dora_core::ui::UserInterface;
use dora_core::watch::tracked_files;
use dora_core::{find_project_root, find_project_root_from_dir};
use dora_core::{ChangeOutcome, ChangeWatcher, NotifyBackend, PushTrigger, WatchBackend};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, instrument, warn};

use crate::cli::Session;
use crate::terminal::TerminalUi;

#[derive(Args, Debug)]
pub struct Watch {
    /// File or directory inside the project; defaults to the current directory
    pub path: Option<PathBuf>,

    /// Quiet period after a save before pushing, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub debounce_ms: u64,
}

impl Watch {
    #[instrument(skip(session))]
    pub async fn run(&self, session: &Session) -> Result<()> {
        let target = self.path.clone().unwrap_or_else(|| PathBuf::from("."));
        let root = if target.is_dir() {
            find_project_root_from_dir(&target)?
        } else {
            find_project_root(&target)?
        };

        let config = session.config_source();
        let exclude = ExcludeSet::new(&config.exclude())?;
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let backend = NotifyBackend::new(events_tx, Duration::from_millis(self.debounce_ms))?;
        let mut watcher = ChangeWatcher::new(backend, config.clone());
        for file in tracked_files(&root, &exclude) {
            if let Err(e) = watcher.activate(&file) {
                warn!("Not watching {}: {}", file.display(), e);
            }
        }

        let orchestrator = session.orchestrator(TerminalUi::new(None, Some(root.clone())))?;
        info!("Watching {} files under {}", watcher.watched_count(), root.display());
        println!(
            "{}{} {}",
            "==> ".bold().blue(),
            format!(
                "Watching {} files in {}",
                watcher.watched_count(),
                root.display()
            )
            .bold(),
            format!(
                "(autoPush {}, Ctrl-C to stop)",
                if config.auto_push() { "on" } else { "off" }
            )
            .dimmed()
        );

        drive(
            &watcher,
            &mut events_rx,
            &orchestrator,
            orchestrator.ui(),
            tokio::signal::ctrl_c(),
        )
        .await
    }
}

/// Feeds change events to the watcher until `shutdown` resolves, which also cuts short a
/// push that is still in flight.
async fn drive<B, T, U, S, E>(
    watcher: &ChangeWatcher<B>,
    events: &mut UnboundedReceiver<PathBuf>,
    trigger: &T,
    ui: &U,
    shutdown: S,
) -> Result<()>
where
    B: WatchBackend,
    T: PushTrigger,
    U: UserInterface + ?Sized,
    S: Future<Output = E>,
{
    tokio::pin!(shutdown);
    loop {
        let path = tokio::select! {
            _ = &mut shutdown => break,
            changed = events.recv() => match changed {
                Some(path) => path,
                None => return Err(DoraError::Watch("File watcher stopped".to_string())),
            },
        };
        let outcome = tokio::select! {
            _ = &mut shutdown => break,
            outcome = watcher.handle_change(&path, trigger) => outcome,
        };
        match outcome {
            ChangeOutcome::Pushed(report) => {
                debug!("Auto-pushed {}", report.root.display());
            }
            ChangeOutcome::AutoPushDisabled | ChangeOutcome::NotWatched => {}
            ChangeOutcome::Failed(e @ DoraError::Busy(_)) => {
                debug!("Skipping change to {}: {}", path.display(), e);
            }
            ChangeOutcome::Failed(e) => {
                warn!("Auto-push after change to {} failed: {:#}", path.display(), e);
                ui.show_error(&e.user_message());
            }
        }
    }
    debug!("Watch shutdown requested");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use dora_common::config::Config;
    use dora_core::PushReport;
    use tokio::sync::oneshot;

    use super::*;

    struct InstantBackend;

    impl WatchBackend for InstantBackend {
        type Handle = ();

        fn watch(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    /// A push that never finishes, as with a device that stops answering mid-upload.
    #[derive(Default)]
    struct StalledPush {
        started: AtomicUsize,
    }

    #[async_trait]
    impl PushTrigger for StalledPush {
        async fn push_from(&self, _active_file: &Path) -> Result<PushReport> {
            self.started.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_push_in_flight() {
        let config: Arc<dyn ConfigSource> = Arc::new(Config {
            auto_push: true,
            ..Config::default()
        });
        let mut watcher = ChangeWatcher::new(InstantBackend, config);
        let file = PathBuf::from("/p/src/a.js");
        watcher.activate(&file).unwrap();

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        events_tx.send(file).unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let trigger = StalledPush::default();
        let ui = TerminalUi::default();

        let stopper = async {
            while trigger.started.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
            let _ = stop_tx.send(());
        };
        let run = drive(&watcher, &mut events_rx, &trigger, &ui, stop_rx);
        let (result, ()) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(run, stopper)
        })
        .await
        .expect("watch loop ignored shutdown");

        assert!(result.is_ok());
        assert_eq!(trigger.started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn closed_event_channel_is_an_error() {
        let watcher = ChangeWatcher::new(InstantBackend, Arc::new(Config::default()));
        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<PathBuf>();
        drop(events_tx);
        let trigger = StalledPush::default();

        let err = drive(
            &watcher,
            &mut events_rx,
            &trigger,
            &TerminalUi::default(),
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DoraError::Watch(_)));
    }
}
