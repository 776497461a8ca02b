// dora-common/src/config.rs
use std::env;
use std::fs;
use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Host;

use super::error::{DoraError, Result};

/// Port the device-side Dora.js service listens on.
pub const REMOTE_PORT: u16 = 4000;
/// File whose presence marks an addon project root.
pub const MANIFEST_FILENAME: &str = "package.json";

const CONFIG_FILENAME: &str = "config.json";
const CONFIG_DIR_ENV: &str = "DORA_CONFIG_DIR";
const HOST_ENV: &str = "DORA_HOST";
const AUTO_PUSH_ENV: &str = "DORA_AUTO_PUSH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub host: Option<String>,
    pub auto_push: bool,
    /// Extra glob patterns excluded from pushed archives.
    pub exclude: Vec<String>,
}

impl Config {
    /// Reads a config file, falling back to defaults when it does not exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(
                "Config file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            DoraError::Config(format!("Invalid config file {}: {e}", path.display()))
        })?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(host) = env::var(HOST_ENV).ok().filter(|s| !s.is_empty()) {
            debug!("Host overridden by {HOST_ENV}: {host}");
            self.host = Some(host);
        }
        if let Ok(value) = env::var(AUTO_PUSH_ENV) {
            self.auto_push = parse_switch(&value).unwrap_or_else(|| {
                warn!("Ignoring unrecognised {AUTO_PUSH_ENV} value '{value}'");
                self.auto_push
            });
        }
    }
}

/// Parses the on/off spellings accepted on the command line and in the environment.
pub fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Normalises a user-entered host: a bare IP literal or DNS name, no scheme, port or path.
pub fn validate_host(candidate: &str) -> Result<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(DoraError::Validation("Host must not be empty".to_string()));
    }
    match trimmed.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => return Ok(ip.to_string()),
        Ok(IpAddr::V6(ip)) => return Ok(format!("[{ip}]")),
        Err(_) => {}
    }
    match Host::parse(trimmed) {
        Ok(Host::Domain(domain)) => Ok(domain),
        Ok(Host::Ipv4(ip)) => Ok(ip.to_string()),
        Ok(Host::Ipv6(ip)) => Ok(format!("[{ip}]")),
        Err(e) => Err(DoraError::Validation(format!(
            "Invalid host address '{trimmed}': {e}"
        ))),
    }
}

/// Read side of the configuration, consulted before every operation that needs it.
pub trait ConfigSource: Send + Sync {
    fn host(&self) -> Option<String>;
    fn auto_push(&self) -> bool;
    fn exclude(&self) -> Vec<String> {
        Vec::new()
    }
}

impl ConfigSource for Config {
    fn host(&self) -> Option<String> {
        self.host.clone()
    }

    fn auto_push(&self) -> bool {
        self.auto_push
    }

    fn exclude(&self) -> Vec<String> {
        self.exclude.clone()
    }
}

/// File-backed configuration under the user's config directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl ConfigStore {
    pub fn open() -> Result<Self> {
        if let Some(dir) = env::var_os(CONFIG_DIR_ENV).filter(|s| !s.is_empty()) {
            let dir = PathBuf::from(dir);
            debug!("Using config dir from {CONFIG_DIR_ENV}: {}", dir.display());
            return Ok(Self::at(dir));
        }
        let dirs = ProjectDirs::from("", "", "dora").ok_or_else(|| {
            DoraError::Config("Could not determine the user's config directory".to_string())
        })?;
        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
            data_dir: dirs.data_dir().to_path_buf(),
        })
    }

    /// A store rooted at a single directory holding both config and data.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            config_dir: dir.clone(),
            data_dir: dir,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILENAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Loads the persisted config with environment overrides applied.
    pub fn load(&self) -> Result<Config> {
        let mut config = self.load_file()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads only what is persisted on disk.
    pub fn load_file(&self) -> Result<Config> {
        Config::from_file(&self.config_path())
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        let body = serde_json::to_string_pretty(config)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.config_dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.persist(self.config_path())
            .map_err(|e| DoraError::from(e.error))?;
        debug!("Saved config to {}", self.config_path().display());
        Ok(())
    }

    fn current(&self) -> Config {
        self.load().unwrap_or_else(|e| {
            warn!("Failed to read config, using defaults: {e}");
            Config::default()
        })
    }
}

impl ConfigSource for ConfigStore {
    fn host(&self) -> Option<String> {
        self.current().host
    }

    fn auto_push(&self) -> bool {
        self.current().auto_push
    }

    fn exclude(&self) -> Vec<String> {
        self.current().exclude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(dir.path());
        let config = store.load_file().unwrap();
        assert_eq!(config, Config::default());
        assert!(config.host.is_none());
        assert!(!config.auto_push);
    }

    #[test]
    fn save_then_reload_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("nested"));
        let config = Config {
            host: Some("192.168.0.100".into()),
            auto_push: true,
            exclude: vec!["*.log".into()],
        };
        store.save(&config).unwrap();
        assert_eq!(store.load_file().unwrap(), config);
        let raw = fs::read_to_string(store.config_path()).unwrap();
        assert!(raw.contains("autoPush"));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "{ not json").unwrap();
        let err = ConfigStore::at(dir.path()).load_file().unwrap_err();
        assert!(err.is_config());
        assert!(err.user_message().contains("Invalid config file"));
    }

    #[test]
    fn validate_host_accepts_ips_and_names() {
        assert_eq!(validate_host(" 192.168.0.100 ").unwrap(), "192.168.0.100");
        assert_eq!(validate_host("::1").unwrap(), "[::1]");
        assert_eq!(validate_host("dora.local").unwrap(), "dora.local");
    }

    #[test]
    fn validate_host_rejects_urls_and_garbage() {
        assert!(validate_host("").is_err());
        assert!(validate_host("http://10.0.0.1").is_err());
        assert!(validate_host("10.0.0.1:4000").is_err());
        assert!(validate_host("a b").is_err());
    }

    #[test]
    fn parse_switch_spellings() {
        assert_eq!(parse_switch("ON"), Some(true));
        assert_eq!(parse_switch("0"), Some(false));
        assert_eq!(parse_switch("maybe"), None);
    }
}
