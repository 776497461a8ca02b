// dora-common/src/lib.rs
pub mod artifact;
pub mod config;
pub mod error;
pub mod model;

// Re-export key types
pub use artifact::{ArtifactTracker, TempArtifact};
pub use config::{Config, ConfigSource, ConfigStore};
pub use error::{DoraError, Result};
pub use model::{Addon, Connection, Manifest, OperationResult};
