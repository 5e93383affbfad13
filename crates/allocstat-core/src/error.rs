//! Error types for configuration and snapshot loading.

use thiserror::Error;

use crate::types::{BlockStatus, JobType};

/// Errors raised while loading or validating a status-priority config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("status {status} listed more than once for {job_type} jobs")]
    DuplicateStatus {
        job_type: JobType,
        status: BlockStatus,
    },
}

/// Errors raised while loading a job/allocation snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid snapshot: {0}")]
    Decode(#[from] serde_json::Error),
}
