// dora-common/src/model/addon.rs
use serde::{Deserialize, Serialize};

/// An addon as reported by the device's listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAddon", rename_all = "camelCase")]
pub struct Addon {
    pub id: i64,
    pub uuid: String,
    pub display_name: String,
    pub version: String,
    pub author: String,
}

// Older device builds send `label` instead of `displayName`; some send both.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAddon {
    id: i64,
    uuid: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

impl From<RawAddon> for Addon {
    fn from(raw: RawAddon) -> Self {
        let display_name = raw
            .display_name
            .filter(|s| !s.is_empty())
            .or(raw.label)
            .unwrap_or_else(|| raw.uuid.clone());
        Self {
            id: raw.id,
            uuid: raw.uuid,
            display_name,
            version: raw.version.unwrap_or_default(),
            author: raw.author.unwrap_or_default(),
        }
    }
}

/// Whether the configured device could be reached, and what it reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    Disconnected,
    Connected(Vec<Addon>),
}

impl Connection {
    pub fn is_connected(&self) -> bool {
        matches!(self, Connection::Connected(_))
    }

    pub fn addons(&self) -> &[Addon] {
        match self {
            Connection::Connected(addons) => addons,
            Connection::Disconnected => &[],
        }
    }

    pub fn find(&self, uuid: &str) -> Option<&Addon> {
        self.addons().iter().find(|a| a.uuid == uuid)
    }
}
