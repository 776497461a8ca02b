// dora-common/src/model/manifest.rs
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::MANIFEST_FILENAME;
use crate::error::{DoraError, Result};

/// The parts of a project's `package.json` that tie it to a device addon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl Manifest {
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(MANIFEST_FILENAME);
        let raw = fs::read_to_string(&path).map_err(|e| {
            DoraError::NotFound(format!("Cannot read manifest {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            DoraError::Validation(format!(
                "Manifest {} has no usable uuid: {e}",
                path.display()
            ))
        })
    }

    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.uuid)
    }
}
