//! Aggregate job status derived from an allocation block.

use std::fmt;

use serde::Serialize;

use allocstat_core::{BlockStatus, Job};

use crate::block::AllocationBlock;

/// Human-facing job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatusLabel {
    /// A deployment is in progress.
    Deploying,
    /// Batch/sysbatch only: every expected allocation completed.
    Complete,
    /// Batch/sysbatch only: every expected allocation is running or complete.
    Running,
    /// Every expected allocation is running.
    Healthy,
    /// Some allocations are pending.
    Recovering,
    /// Some allocations are failed, lost, or unplaced.
    Degraded,
    /// All expected allocations are failed, lost, or unplaced.
    Failed,
    /// The job has been garbage collected on the server.
    Removed,
}

impl StatusLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLabel::Deploying => "Deploying",
            StatusLabel::Complete => "Complete",
            StatusLabel::Running => "Running",
            StatusLabel::Healthy => "Healthy",
            StatusLabel::Recovering => "Recovering",
            StatusLabel::Degraded => "Degraded",
            StatusLabel::Failed => "Failed",
            StatusLabel::Removed => "Removed",
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity tag for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Highlight,
    Success,
    Warning,
    Critical,
    Neutral,
}

impl StatusState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusState::Highlight => "highlight",
            StatusState::Success => "success",
            StatusState::Warning => "warning",
            StatusState::Critical => "critical",
            StatusState::Neutral => "neutral",
        }
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct JobStatus {
    pub label: StatusLabel,
    pub state: StatusState,
}

impl JobStatus {
    pub const fn new(label: StatusLabel, state: StatusState) -> Self {
        Self { label, state }
    }
}

/// Summarize a job's health in a single label.
///
/// Checks run in a fixed order and the first match wins: an active
/// deployment always reports `Deploying`, batch completion is checked before
/// generic health, and pending allocations report `Recovering` before any
/// failure is declared.
pub fn aggregate_status(job: &Job, block: &AllocationBlock<'_>) -> JobStatus {
    let desired = block.desired();

    if job.is_deploying() {
        return JobStatus::new(StatusLabel::Deploying, StatusState::Highlight);
    }

    if job.assume_gc {
        return JobStatus::new(StatusLabel::Removed, StatusState::Neutral);
    }

    let running = block.healthy_non_canary(BlockStatus::Running);

    if job.job_type.runs_to_completion() {
        let complete = block.healthy_non_canary(BlockStatus::Complete);
        if complete == Some(desired) {
            return JobStatus::new(StatusLabel::Complete, StatusState::Success);
        }
        if running.zip(complete).is_some_and(|(r, c)| r + c == desired) {
            return JobStatus::new(StatusLabel::Running, StatusState::Success);
        }
    }

    if desired > 0 && running == Some(desired) {
        return JobStatus::new(StatusLabel::Healthy, StatusState::Success);
    }

    if block.healthy_non_canary(BlockStatus::Pending).unwrap_or(0) > 0 {
        return JobStatus::new(StatusLabel::Recovering, StatusState::Highlight);
    }

    let failed_or_lost: usize = [BlockStatus::Failed, BlockStatus::Lost, BlockStatus::Unplaced]
        .into_iter()
        .filter_map(|status| block.healthy_non_canary(status))
        .sum();

    if failed_or_lost >= desired {
        JobStatus::new(StatusLabel::Failed, StatusState::Critical)
    } else {
        JobStatus::new(StatusLabel::Degraded, StatusState::Warning)
    }
}
