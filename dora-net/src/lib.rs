// dora-net/src/lib.rs
pub mod http;

pub use dora_common::error::{DoraError, Result};
pub use http::{RemoteClient, DEFAULT_TIMEOUT};
