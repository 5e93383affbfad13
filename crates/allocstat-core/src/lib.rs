//! allocstat-core — shared types for allocation classification.
//!
//! Holds the read-only job and allocation records, the per-job-type
//! status-priority configuration, and snapshot loading.

pub mod config;
pub mod error;
pub mod snapshot;
pub mod types;

pub use config::StatusPriorities;
pub use error::{ConfigError, SnapshotError};
pub use snapshot::Snapshot;
pub use types::*;
