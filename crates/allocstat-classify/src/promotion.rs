//! Canary promotion eligibility.
//!
//! A deployment that requires promotion stays gated until an operator (or
//! auto-promote) confirms the canaries. These helpers decide whether a
//! "promote" action should be offered, or a "canary failed" notice instead.

use serde::Serialize;
use tracing::debug;

use allocstat_core::{Allocation, ClientStatus, Job};

use crate::block::AllocationBlock;

/// What the caller should offer for the job's current deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PromotionState {
    /// No active deployment waiting on canaries.
    NotRequired,
    /// All canaries are running and healthy.
    Promote,
    /// At least one canary failed, was lost, or is unhealthy.
    CanaryFailed,
    /// Canaries are still settling.
    AwaitingCanaries { auto_promote: bool },
}

/// Canaries placed under the current version that were not replaced.
fn current_canaries(allocations: &[Allocation]) -> impl Iterator<Item = &Allocation> {
    allocations
        .iter()
        .filter(|a| !a.is_old && a.is_canary && !a.has_been_rescheduled)
}

/// True when at least one current canary exists and all are running and
/// healthy. Promotion is rejected by the server otherwise.
pub fn canaries_healthy(allocations: &[Allocation]) -> bool {
    let mut canaries = current_canaries(allocations).peekable();
    canaries.peek().is_some()
        && canaries.all(|a| a.client_status == ClientStatus::Running && a.is_healthy)
}

pub fn some_canaries_failed(allocations: &[Allocation]) -> bool {
    current_canaries(allocations).any(|a| {
        matches!(a.client_status, ClientStatus::Failed | ClientStatus::Lost) || a.is_unhealthy
    })
}

/// A deployment is active and the block placed at least one canary.
pub fn has_active_canaries(job: &Job, block: &AllocationBlock<'_>) -> bool {
    job.is_deploying() && block.has_canaries()
}

pub fn promotion_state(
    job: &Job,
    allocations: &[Allocation],
    block: &AllocationBlock<'_>,
) -> PromotionState {
    let deployment = &job.latest_deployment;
    if !has_active_canaries(job, block) || !deployment.requires_promotion {
        return PromotionState::NotRequired;
    }

    let state = if canaries_healthy(allocations) {
        PromotionState::Promote
    } else if some_canaries_failed(allocations) {
        PromotionState::CanaryFailed
    } else {
        PromotionState::AwaitingCanaries {
            auto_promote: deployment.all_auto_promote,
        }
    };

    debug!(job = %job.id, ?state, "evaluated canary promotion");
    state
}
