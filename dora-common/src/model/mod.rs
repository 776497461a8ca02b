// dora-common/src/model/mod.rs
pub mod addon;
pub mod manifest;
pub mod result;

// Re-export
pub use addon::{Addon, Connection};
pub use manifest::Manifest;
pub use result::OperationResult;
