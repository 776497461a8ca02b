#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dora_common::artifact::ArtifactTracker;
use dora_common::config::{Config, ConfigSource};
use dora_common::error::Result;
use dora_common::model::{Addon, OperationResult};
use dora_core::sync::{PushReport, PushTrigger, SyncOrchestrator};
use dora_core::ui::UserInterface;
use dora_core::watch::WatchBackend;
use dora_net::RemoteClient;
use walkdir::WalkDir;

pub enum DestinationChoice {
    AcceptDefault,
    Choose(PathBuf),
    Decline,
}

/// A UI that answers prompts from a script and records what it was asked.
pub struct ScriptedUi {
    pub active: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
    pub destination: DestinationChoice,
    pub overwrite: bool,
    pub hosts: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
    pub infos: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl Default for ScriptedUi {
    fn default() -> Self {
        Self {
            active: None,
            workspace: None,
            destination: DestinationChoice::Decline,
            overwrite: false,
            hosts: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            infos: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedUi {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl UserInterface for ScriptedUi {
    fn active_file(&self) -> Option<PathBuf> {
        self.active.clone()
    }

    fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace.clone()
    }

    fn select_destination(&self, _addon: &Addon, default: &Path) -> Option<PathBuf> {
        self.prompts
            .lock()
            .unwrap()
            .push(format!("destination:{}", default.display()));
        match &self.destination {
            DestinationChoice::AcceptDefault => Some(default.to_path_buf()),
            DestinationChoice::Choose(path) => Some(path.clone()),
            DestinationChoice::Decline => None,
        }
    }

    fn confirm_overwrite(&self, destination: &Path) -> bool {
        self.prompts
            .lock()
            .unwrap()
            .push(format!("overwrite:{}", destination.display()));
        self.overwrite
    }

    fn request_host(&self, current: Option<&str>) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .push(format!("host:{}", current.unwrap_or("")));
        self.hosts.lock().unwrap().pop_front()
    }

    fn show_info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

pub fn config(host: Option<&str>) -> Arc<dyn ConfigSource> {
    Arc::new(Config {
        host: host.map(str::to_string),
        ..Config::default()
    })
}

pub fn client(config: Arc<dyn ConfigSource>, port: u16) -> RemoteClient {
    RemoteClient::new(config).expect("client").with_port(port)
}

pub fn orchestrator(
    host: Option<&str>,
    port: u16,
    ui: ScriptedUi,
) -> SyncOrchestrator<ScriptedUi> {
    let config = config(host);
    SyncOrchestrator::new(
        client(config.clone(), port),
        config,
        ui,
        ArtifactTracker::new(),
    )
}

/// A port nothing listens on.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("addr").port()
}

/// `package.json`, `src/a.js`, `src/deep/b.js`, `node_modules/x.js`.
pub fn sample_project(root: &Path) {
    fs::create_dir_all(root.join("src/deep")).unwrap();
    fs::create_dir_all(root.join("node_modules")).unwrap();
    fs::write(
        root.join("package.json"),
        r#"{"name": "weather", "uuid": "u-1"}"#,
    )
    .unwrap();
    fs::write(root.join("src/a.js"), "console.log('a')").unwrap();
    fs::write(root.join("src/deep/b.js"), "console.log('b')").unwrap();
    fs::write(root.join("node_modules/x.js"), "dependency").unwrap();
}

pub fn weather_addon() -> Addon {
    Addon {
        id: 1,
        uuid: "u-1".to_string(),
        display_name: "Weather".to_string(),
        version: "1.0.0".to_string(),
        author: "dora".to_string(),
    }
}

/// Sorted relative paths of every regular file under `dir`.
pub fn file_set(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

#[derive(Default)]
pub struct FakeBackend {
    pub registered: Vec<PathBuf>,
}

impl WatchBackend for FakeBackend {
    type Handle = ();

    fn watch(&mut self, path: &Path) -> Result<()> {
        self.registered.push(path.to_path_buf());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingTrigger {
    pub pushes: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl PushTrigger for RecordingTrigger {
    async fn push_from(&self, active_file: &Path) -> Result<PushReport> {
        self.pushes.lock().unwrap().push(active_file.to_path_buf());
        Ok(PushReport {
            root: active_file.parent().unwrap_or(active_file).to_path_buf(),
            result: OperationResult::default(),
        })
    }
}
