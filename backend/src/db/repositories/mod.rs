//! Repository implementations module.
//!
//! - `local`: In-memory implementation for unit testing, local runs and snapshot replays
pub mod local;

pub use local::{LocalRepository, StoreSnapshot};
