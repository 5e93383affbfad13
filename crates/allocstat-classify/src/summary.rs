//! Job-level allocation counts shown alongside the status panel.

use serde::Serialize;

use allocstat_core::{Allocation, ClientStatus, Job};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllocationSummary {
    /// Slots the job wants filled.
    pub desired: usize,
    /// Allocations placed under the current job version.
    pub latest_version: usize,
    /// Current-version allocations that replaced an earlier one.
    pub rescheduled: usize,
    /// Current-version allocations with at least one task restart.
    pub restarted: usize,
    /// Current-version allocations that completed.
    pub completed: usize,
    pub supports_rescheduling: bool,
}

impl AllocationSummary {
    pub fn from_allocations(job: &Job, allocations: &[Allocation]) -> Self {
        let mut summary = Self {
            desired: job.desired_count(allocations),
            latest_version: 0,
            rescheduled: 0,
            restarted: 0,
            completed: 0,
            supports_rescheduling: job.job_type.supports_rescheduling(),
        };

        for alloc in allocations.iter().filter(|a| !a.is_old) {
            summary.latest_version += 1;
            if alloc.has_been_rescheduled {
                summary.rescheduled += 1;
            }
            if alloc.has_been_restarted {
                summary.restarted += 1;
            }
            if alloc.client_status == ClientStatus::Complete {
                summary.completed += 1;
            }
        }

        summary
    }

    /// Desired slots not accounted for by a completed allocation.
    pub fn non_completed(&self) -> usize {
        self.desired.saturating_sub(self.completed)
    }

    pub fn all_complete(&self) -> bool {
        self.completed > 0 && self.completed == self.desired
    }
}
