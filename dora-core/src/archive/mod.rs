// dora-core/src/archive/mod.rs
pub mod build;
pub mod extract;

pub use build::{build_archive, ExcludeSet, DEFAULT_EXCLUDES};
pub use extract::extract_archive;
