//! Status-priority configuration.
//!
//! Each job type owns an ordered list of block statuses. The list decides
//! which buckets an allocation block carries for that job type, and its
//! order is the tie-break priority used when filling slots from
//! non-running allocations (earlier = more relevant).
//!
//! ```toml
//! [priorities]
//! service = ["running", "pending", "failed", "lost", "unplaced", "complete"]
//! batch = ["running", "pending", "complete", "failed", "lost", "unplaced"]
//! ```
//!
//! Job types missing from the file keep their defaults.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::types::{BlockStatus, JobType};

/// Default order for long-running jobs (service, system).
pub const LONG_RUNNING_ORDER: [BlockStatus; 6] = [
    BlockStatus::Running,
    BlockStatus::Pending,
    BlockStatus::Failed,
    BlockStatus::Lost,
    BlockStatus::Unplaced,
    BlockStatus::Complete,
];

/// Default order for run-to-completion jobs (batch, sysbatch).
pub const RUN_TO_COMPLETION_ORDER: [BlockStatus; 6] = [
    BlockStatus::Running,
    BlockStatus::Pending,
    BlockStatus::Complete,
    BlockStatus::Failed,
    BlockStatus::Lost,
    BlockStatus::Unplaced,
];

/// On-disk shape of a priorities file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrioritiesFile {
    #[serde(default)]
    pub priorities: PriorityTable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriorityTable {
    pub service: Option<Vec<BlockStatus>>,
    pub batch: Option<Vec<BlockStatus>>,
    pub system: Option<Vec<BlockStatus>>,
    pub sysbatch: Option<Vec<BlockStatus>>,
}

impl PriorityTable {
    fn get(&self, job_type: JobType) -> Option<&Vec<BlockStatus>> {
        match job_type {
            JobType::Service => self.service.as_ref(),
            JobType::Batch => self.batch.as_ref(),
            JobType::System => self.system.as_ref(),
            JobType::Sysbatch => self.sysbatch.as_ref(),
        }
    }
}

/// Per-job-type status ordering handed to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPriorities {
    orders: BTreeMap<JobType, Vec<BlockStatus>>,
}

impl Default for StatusPriorities {
    fn default() -> Self {
        let orders = JobType::ALL
            .into_iter()
            .map(|job_type| (job_type, default_order(job_type).to_vec()))
            .collect();
        Self { orders }
    }
}

impl StatusPriorities {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: PrioritiesFile = toml::from_str(content)?;
        let mut priorities = Self::default();
        for job_type in JobType::ALL {
            if let Some(order) = file.priorities.get(job_type) {
                priorities.set(job_type, order.clone())?;
            }
        }
        Ok(priorities)
    }

    /// Replace the order for one job type.
    pub fn set(&mut self, job_type: JobType, order: Vec<BlockStatus>) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for status in &order {
            if !seen.insert(*status) {
                return Err(ConfigError::DuplicateStatus {
                    job_type,
                    status: *status,
                });
            }
        }
        for required in [BlockStatus::Running, BlockStatus::Pending] {
            if !seen.contains(&required) {
                warn!(
                    job_type = %job_type,
                    status = %required,
                    "status priority list omits an active status; those allocations will be ignored"
                );
            }
        }
        self.orders.insert(job_type, order);
        Ok(())
    }

    /// Ordered statuses for a job type, most relevant first.
    pub fn statuses_for(&self, job_type: JobType) -> &[BlockStatus] {
        self.orders
            .get(&job_type)
            .map(Vec::as_slice)
            .unwrap_or_else(|| default_order(job_type))
    }

    /// Position of `status` in the job type's list, or `None` if absent.
    pub fn rank(&self, job_type: JobType, status: BlockStatus) -> Option<usize> {
        self.statuses_for(job_type).iter().position(|s| *s == status)
    }

    pub fn to_file(&self) -> PrioritiesFile {
        let order = |job_type| Some(self.statuses_for(job_type).to_vec());
        PrioritiesFile {
            priorities: PriorityTable {
                service: order(JobType::Service),
                batch: order(JobType::Batch),
                system: order(JobType::System),
                sysbatch: order(JobType::Sysbatch),
            },
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self.to_file())?)
    }
}

fn default_order(job_type: JobType) -> &'static [BlockStatus] {
    if job_type.runs_to_completion() {
        &RUN_TO_COMPLETION_ORDER
    } else {
        &LONG_RUNNING_ORDER
    }
}
