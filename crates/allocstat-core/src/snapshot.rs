//! Point-in-time job + allocation snapshot, as read from a JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::types::{Allocation, Job};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub job: Job,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
}

impl Snapshot {
    pub fn from_file(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn desired_count(&self) -> usize {
        self.job.desired_count(&self.allocations)
    }
}
