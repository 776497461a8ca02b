// dora-core/src/lib.rs
pub mod archive;
pub mod host;
pub mod project;
pub mod sync;
pub mod ui;
pub mod watch;

pub use host::configure_host;
pub use project::{find_project_root, find_project_root_from_dir};
pub use sync::{PullOutcome, PushReport, PushTrigger, Stage, SyncOrchestrator};
pub use ui::UserInterface;
pub use watch::{ChangeOutcome, ChangeWatcher, NotifyBackend, WatchBackend};
