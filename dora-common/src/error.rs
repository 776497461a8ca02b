use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DoraError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    /// The remote host has not been configured yet.
    #[error("Host not set")]
    HostNotSet,

    #[error("Host is unavailable: {0}")]
    HostUnavailable(String),

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Not a Dora.js addon project: {}", .0.display())]
    NotAProject(PathBuf),

    #[error("Build Error: {0}")]
    Build(String),

    #[error("Extraction Error: {0}")]
    Extraction(String),

    #[error("Resource Not Found: {0}")]
    NotFound(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("A {0} is already in progress")]
    Busy(&'static str),

    #[error("Watch Error: {0}")]
    Watch(String),

    #[error("No active file: open any file inside an addon project")]
    NoActiveFile,
}

impl DoraError {
    /// Text shown to the user. Transport failures stay generic, the detail goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            DoraError::Transport(_) => "Failed to reach the device, check your network".to_string(),
            DoraError::HostUnavailable(_) => "Host is unavailable".to_string(),
            DoraError::HostNotSet => "Host not set, run `dora host <address>` first".to_string(),
            other => other.to_string(),
        }
    }

    /// Host unset, or a config file that cannot be used.
    pub fn is_config(&self) -> bool {
        matches!(self, DoraError::Config(_) | DoraError::HostNotSet)
    }
}

impl From<std::io::Error> for DoraError {
    fn from(err: std::io::Error) -> Self {
        DoraError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for DoraError {
    fn from(err: serde_json::Error) -> Self {
        DoraError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, DoraError>;
