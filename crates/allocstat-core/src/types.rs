//! Shared types used across allocstat crates.
//!
//! These mirror the records a scheduler API reports for a job and its
//! allocations. The classifier only ever reads them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for an allocation.
pub type AllocationId = String;

/// Unique identifier for a client node.
pub type NodeId = String;

// ── Job type ──────────────────────────────────────────────────────

/// Scheduling class of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Long-running, fixed replica count.
    Service,
    /// Run-to-completion, fixed replica count.
    Batch,
    /// Long-running, one allocation per eligible node.
    System,
    /// Run-to-completion, one allocation per eligible node.
    Sysbatch,
}

impl JobType {
    pub const ALL: [JobType; 4] = [
        JobType::Service,
        JobType::Batch,
        JobType::System,
        JobType::Sysbatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Service => "service",
            JobType::Batch => "batch",
            JobType::System => "system",
            JobType::Sysbatch => "sysbatch",
        }
    }

    /// System and sysbatch jobs place at most one allocation per node.
    pub fn at_most_one_alloc_per_node(&self) -> bool {
        matches!(self, JobType::System | JobType::Sysbatch)
    }

    /// Batch and sysbatch allocations are expected to finish.
    pub fn runs_to_completion(&self) -> bool {
        matches!(self, JobType::Batch | JobType::Sysbatch)
    }

    pub fn supports_rescheduling(&self) -> bool {
        !matches!(self, JobType::System)
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Client status ─────────────────────────────────────────────────

/// Lifecycle status of an allocation as reported by its client node.
///
/// Strings outside the known set decode to [`ClientStatus::Unrecognized`]
/// rather than failing, so a single malformed record never rejects a whole
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum ClientStatus {
    Running,
    Pending,
    Failed,
    Lost,
    Complete,
    /// The client lost contact and the allocation state is unknown.
    Unknown,
    Unrecognized,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Running => "running",
            ClientStatus::Pending => "pending",
            ClientStatus::Failed => "failed",
            ClientStatus::Lost => "lost",
            ClientStatus::Complete => "complete",
            ClientStatus::Unknown => "unknown",
            ClientStatus::Unrecognized => "unrecognized",
        }
    }

    /// Running or pending: the allocation occupies (or will occupy) a slot.
    pub fn is_active(&self) -> bool {
        matches!(self, ClientStatus::Running | ClientStatus::Pending)
    }
}

impl From<&str> for ClientStatus {
    fn from(s: &str) -> Self {
        match s {
            "running" => ClientStatus::Running,
            "pending" => ClientStatus::Pending,
            "failed" => ClientStatus::Failed,
            "lost" => ClientStatus::Lost,
            "complete" => ClientStatus::Complete,
            "unknown" => ClientStatus::Unknown,
            _ => ClientStatus::Unrecognized,
        }
    }
}

impl From<String> for ClientStatus {
    fn from(s: String) -> Self {
        ClientStatus::from(s.as_str())
    }
}

impl From<ClientStatus> for &'static str {
    fn from(status: ClientStatus) -> Self {
        status.as_str()
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Block status ──────────────────────────────────────────────────

/// Key of a top-level bucket in an allocation block.
///
/// Every real client status has a counterpart here, plus the synthetic
/// `Unplaced` status for desired slots no allocation fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    Running,
    Pending,
    Complete,
    Failed,
    Lost,
    Unknown,
    Unplaced,
}

impl BlockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockStatus::Running => "running",
            BlockStatus::Pending => "pending",
            BlockStatus::Complete => "complete",
            BlockStatus::Failed => "failed",
            BlockStatus::Lost => "lost",
            BlockStatus::Unknown => "unknown",
            BlockStatus::Unplaced => "unplaced",
        }
    }

    /// Bucket for a real allocation's status. `None` for unrecognized values.
    pub fn for_client(status: ClientStatus) -> Option<Self> {
        match status {
            ClientStatus::Running => Some(BlockStatus::Running),
            ClientStatus::Pending => Some(BlockStatus::Pending),
            ClientStatus::Failed => Some(BlockStatus::Failed),
            ClientStatus::Lost => Some(BlockStatus::Lost),
            ClientStatus::Complete => Some(BlockStatus::Complete),
            ClientStatus::Unknown => Some(BlockStatus::Unknown),
            ClientStatus::Unrecognized => None,
        }
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Allocation ────────────────────────────────────────────────────

/// One scheduled instance of a task group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub client_status: ClientStatus,
    /// Version of the job spec this allocation was placed under.
    #[serde(default)]
    pub job_version: u64,
    #[serde(default)]
    pub is_canary: bool,
    /// Deployment health. Only meaningful while running.
    #[serde(default)]
    pub is_healthy: bool,
    #[serde(default)]
    pub is_unhealthy: bool,
    /// Placed under a version other than the job's current one.
    #[serde(default)]
    pub is_old: bool,
    /// Restart attempts are exhausted.
    #[serde(default)]
    pub will_not_restart: bool,
    /// Reschedule attempts are exhausted.
    #[serde(default)]
    pub will_not_reschedule: bool,
    #[serde(default)]
    pub has_been_rescheduled: bool,
    #[serde(default)]
    pub has_been_restarted: bool,
    #[serde(default)]
    pub node_id: Option<NodeId>,
}

impl Allocation {
    /// A replacement allocation exists for this one: it stopped restarting
    /// but the scheduler is still free to reschedule it elsewhere.
    pub fn is_superseded(&self) -> bool {
        self.will_not_restart && !self.will_not_reschedule
    }
}

// ── Job ───────────────────────────────────────────────────────────

/// A task group and the number of replicas it asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGroup {
    pub name: String,
    /// Requested replicas. Negative values are treated as zero.
    #[serde(default)]
    pub count: i64,
}

/// Summary of the job's most recent deployment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeploymentSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub requires_promotion: bool,
    #[serde(default)]
    pub all_auto_promote: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_description: Option<String>,
    #[serde(default)]
    pub job_version: Option<u64>,
}

impl DeploymentSummary {
    pub fn is_failed(&self) -> bool {
        self.status.as_deref() == Some("failed")
    }
}

/// The job-level fields the classifier and aggregator read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    #[serde(default)]
    pub task_groups: Vec<TaskGroup>,
    #[serde(default)]
    pub latest_deployment: DeploymentSummary,
    /// The server stopped reporting this job; treat it as removed.
    #[serde(default)]
    pub assume_gc: bool,
}

impl Job {
    pub fn new(id: &str, job_type: JobType) -> Self {
        Self {
            id: id.to_string(),
            job_type,
            task_groups: Vec::new(),
            latest_deployment: DeploymentSummary::default(),
            assume_gc: false,
        }
    }

    /// Builder helper: append a task group.
    pub fn with_group(mut self, name: &str, count: i64) -> Self {
        self.task_groups.push(TaskGroup {
            name: name.to_string(),
            count,
        });
        self
    }

    pub fn is_deploying(&self) -> bool {
        self.latest_deployment.is_active
    }

    /// Number of allocation slots the job should fill.
    ///
    /// Service and batch jobs sum their task-group counts. System and
    /// sysbatch jobs want one allocation per node, so the count is the
    /// number of distinct nodes the allocations landed on.
    pub fn desired_count(&self, allocations: &[Allocation]) -> usize {
        if self.job_type.at_most_one_alloc_per_node() {
            allocations
                .iter()
                .filter_map(|a| a.node_id.as_deref())
                .filter(|node| !node.is_empty())
                .collect::<BTreeSet<_>>()
                .len()
        } else {
            let sum = self
                .task_groups
                .iter()
                .fold(0i64, |acc, tg| acc.saturating_add(tg.count.max(0)));
            usize::try_from(sum).unwrap_or(usize::MAX)
        }
    }
}
