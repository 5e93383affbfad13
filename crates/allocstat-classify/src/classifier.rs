//! Allocation classifier — fills a job's desired slots from its allocations.
//!
//! Two fill strategies, picked by whether a deployment is active:
//!
//! - **Deploying**: only current-version allocations count. Each lands in
//!   its real `[status][health][cohort]` bucket, in input order.
//! - **Steady state**: running and pending allocations go first, all
//!   treated as healthy non-canaries. Remaining slots are filled from the
//!   other allocations, newest job version first, then by the job type's
//!   status priority.
//!
//! Whatever capacity is left becomes `unplaced` placeholders.

use std::cmp::Reverse;

use tracing::{debug, trace};

use allocstat_core::{Allocation, BlockStatus, Job, StatusPriorities};

use crate::block::{AllocationBlock, Cohort, Health, Slot};

/// Classifies allocations against a status-priority table.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    priorities: StatusPriorities,
}

impl Classifier {
    pub fn new(priorities: StatusPriorities) -> Self {
        Self { priorities }
    }

    pub fn priorities(&self) -> &StatusPriorities {
        &self.priorities
    }

    /// Partition `allocations` into a block holding at most
    /// `job.desired_count(allocations)` slots.
    ///
    /// Every unfilled slot becomes a real placeholder entry, so memory use
    /// grows with the desired count, not with the number of allocations.
    pub fn classify<'a>(&self, job: &Job, allocations: &'a [Allocation]) -> AllocationBlock<'a> {
        let desired = job.desired_count(allocations);
        let statuses = self.priorities.statuses_for(job.job_type);
        let mut block = AllocationBlock::with_statuses(desired, statuses);

        let deploying = job.is_deploying();
        let remaining = if deploying {
            fill_deploying(&mut block, allocations, desired)
        } else {
            self.fill_steady(job, &mut block, allocations, desired)
        };

        if remaining > 0 {
            block.fill_unplaced(remaining);
        }

        debug!(
            job = %job.id,
            job_type = %job.job_type,
            deploying,
            desired,
            allocations = allocations.len(),
            unplaced = remaining,
            "classified allocations"
        );

        block
    }

    fn fill_steady<'a>(
        &self,
        job: &Job,
        block: &mut AllocationBlock<'a>,
        allocations: &'a [Allocation],
        desired: usize,
    ) -> usize {
        let mut remaining = desired;

        // Running and pending first. Health and canary status are moot
        // outside a deployment.
        for alloc in allocations.iter().filter(|a| a.client_status.is_active()) {
            if remaining == 0 {
                return 0;
            }
            if place_healthy(block, alloc) {
                remaining -= 1;
            }
        }

        if remaining == 0 {
            return 0;
        }

        let mut rest: Vec<&'a Allocation> = allocations
            .iter()
            .filter(|a| !a.client_status.is_active())
            .collect();
        rest.sort_by_key(|a| {
            let rank = BlockStatus::for_client(a.client_status)
                .and_then(|status| self.priorities.rank(job.job_type, status));
            (Reverse(a.job_version), rank)
        });

        for alloc in rest {
            if remaining == 0 {
                break;
            }
            let Some(status) = BlockStatus::for_client(alloc.client_status) else {
                trace!(alloc = %alloc.id, "ignoring allocation with unrecognized status");
                continue;
            };
            if block.healthy_non_canary(status).is_some_and(|n| n >= desired) {
                trace!(alloc = %alloc.id, status = %status, "status bucket full");
                continue;
            }
            if place_healthy(block, alloc) {
                remaining -= 1;
            }
        }

        remaining
    }
}

/// Deploying fill. Returns the unfilled capacity.
fn fill_deploying<'a>(
    block: &mut AllocationBlock<'a>,
    allocations: &'a [Allocation],
    desired: usize,
) -> usize {
    let mut remaining = desired;

    for alloc in allocations.iter().filter(|a| !a.is_old) {
        if remaining == 0 {
            break;
        }
        if alloc.is_superseded() {
            trace!(alloc = %alloc.id, "skipping superseded allocation");
            continue;
        }
        let Some(status) = BlockStatus::for_client(alloc.client_status) else {
            trace!(alloc = %alloc.id, "ignoring allocation with unrecognized status");
            continue;
        };
        if block.push(status, Health::of(alloc), Cohort::of(alloc), Slot::Placed(alloc)) {
            remaining -= 1;
        } else {
            trace!(alloc = %alloc.id, status = %status, "no bucket for status");
        }
    }

    remaining
}

/// Steady-state placement into `[status].healthy.non_canary`.
fn place_healthy<'a>(block: &mut AllocationBlock<'a>, alloc: &'a Allocation) -> bool {
    if alloc.is_superseded() {
        trace!(alloc = %alloc.id, "skipping superseded allocation");
        return false;
    }
    let Some(status) = BlockStatus::for_client(alloc.client_status) else {
        trace!(alloc = %alloc.id, "ignoring allocation with unrecognized status");
        return false;
    };
    let placed = block.push(status, Health::Healthy, Cohort::NonCanary, Slot::Placed(alloc));
    if !placed {
        trace!(alloc = %alloc.id, status = %status, "no bucket for status");
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use allocstat_core::{ClientStatus, JobType};

    fn alloc(id: &str, status: ClientStatus, version: u64) -> Allocation {
        Allocation {
            id: id.to_string(),
            client_status: status,
            job_version: version,
            is_canary: false,
            is_healthy: false,
            is_unhealthy: false,
            is_old: false,
            will_not_restart: false,
            will_not_reschedule: false,
            has_been_rescheduled: false,
            has_been_restarted: false,
            node_id: None,
        }
    }

    fn ids<'a>(block: &'a AllocationBlock<'_>, status: BlockStatus, health: Health, cohort: Cohort) -> Vec<&'a str> {
        block
            .bucket(status, health, cohort)
            .iter()
            .filter_map(|s| s.allocation())
            .map(|a| a.id.as_str())
            .collect()
    }

    fn deploying(job: Job) -> Job {
        let mut job = job;
        job.latest_deployment.is_active = true;
        job
    }

    #[test]
    fn steady_fills_running_then_pending_in_order() {
        let job = Job::new("web", JobType::Service).with_group("web", 3);
        let allocs = vec![
            alloc("p1", ClientStatus::Pending, 1),
            alloc("r1", ClientStatus::Running, 1),
            alloc("r2", ClientStatus::Running, 1),
            alloc("r3", ClientStatus::Running, 1),
        ];
        let block = Classifier::default().classify(&job, &allocs);

        assert_eq!(ids(&block, BlockStatus::Pending, Health::Healthy, Cohort::NonCanary), vec!["p1"]);
        assert_eq!(
            ids(&block, BlockStatus::Running, Health::Healthy, Cohort::NonCanary),
            vec!["r1", "r2"]
        );
        assert_eq!(block.total(), 3);
        assert_eq!(block.unplaced(), 0);
    }

    #[test]
    fn steady_treats_canaries_and_unhealthy_as_healthy_non_canary() {
        let job = Job::new("web", JobType::Service).with_group("web", 2);
        let mut canary = alloc("c1", ClientStatus::Running, 2);
        canary.is_canary = true;
        canary.is_unhealthy = true;
        let allocs = vec![canary, alloc("r1", ClientStatus::Running, 2)];
        let block = Classifier::default().classify(&job, &allocs);

        assert_eq!(
            ids(&block, BlockStatus::Running, Health::Healthy, Cohort::NonCanary),
            vec!["c1", "r1"]
        );
        assert!(!block.has_canaries());
    }

    #[test]
    fn steady_backfills_newest_version_then_priority() {
        let job = Job::new("web", JobType::Service).with_group("web", 4);
        let allocs = vec![
            alloc("r1", ClientStatus::Running, 5),
            alloc("old-failed", ClientStatus::Failed, 3),
            alloc("lost", ClientStatus::Lost, 5),
            alloc("failed", ClientStatus::Failed, 5),
            alloc("complete", ClientStatus::Complete, 5),
            alloc("older-lost", ClientStatus::Lost, 4),
        ];
        let block = Classifier::default().classify(&job, &allocs);

        // Version 5 first: failed outranks lost, lost outranks complete.
        assert_eq!(ids(&block, BlockStatus::Failed, Health::Healthy, Cohort::NonCanary), vec!["failed"]);
        assert_eq!(ids(&block, BlockStatus::Lost, Health::Healthy, Cohort::NonCanary), vec!["lost"]);
        assert_eq!(
            ids(&block, BlockStatus::Complete, Health::Healthy, Cohort::NonCanary),
            vec!["complete"]
        );
        assert_eq!(block.total(), 4);
        assert_eq!(block.unplaced(), 0);
    }

    #[test]
    fn steady_ignores_statuses_outside_priority_list() {
        let job = Job::new("web", JobType::Service).with_group("web", 2);
        let allocs = vec![
            alloc("gone", ClientStatus::Unknown, 9),
            alloc("junk", ClientStatus::Unrecognized, 9),
            alloc("f1", ClientStatus::Failed, 1),
        ];
        let block = Classifier::default().classify(&job, &allocs);

        assert!(!block.contains(BlockStatus::Unknown));
        assert_eq!(ids(&block, BlockStatus::Failed, Health::Healthy, Cohort::NonCanary), vec!["f1"]);
        assert_eq!(block.unplaced(), 1);
    }

    #[test]
    fn deploying_uses_real_buckets_and_skips_old_versions() {
        let job = deploying(Job::new("web", JobType::Service).with_group("web", 4));
        let mut healthy_canary = alloc("canary", ClientStatus::Running, 2);
        healthy_canary.is_canary = true;
        healthy_canary.is_healthy = true;
        let mut unhealthy = alloc("unhealthy", ClientStatus::Running, 2);
        unhealthy.is_unhealthy = true;
        let mut old = alloc("old", ClientStatus::Running, 1);
        old.is_old = true;
        let mut stale_health = alloc("stale", ClientStatus::Failed, 2);
        stale_health.is_healthy = true;
        let allocs = vec![old, healthy_canary, unhealthy, stale_health];

        let block = Classifier::default().classify(&job, &allocs);

        assert_eq!(ids(&block, BlockStatus::Running, Health::Healthy, Cohort::Canary), vec!["canary"]);
        assert_eq!(
            ids(&block, BlockStatus::Running, Health::Unhealthy, Cohort::NonCanary),
            vec!["unhealthy"]
        );
        assert_eq!(
            ids(&block, BlockStatus::Failed, Health::HealthUnknown, Cohort::NonCanary),
            vec!["stale"]
        );
        assert!(block.has_canaries());
        assert_eq!(block.unplaced(), 1);
        assert_eq!(block.total(), 4);
    }

    #[test]
    fn deploying_skips_superseded_without_consuming_capacity() {
        let job = deploying(Job::new("web", JobType::Service).with_group("web", 2));
        let mut replaced = alloc("replaced", ClientStatus::Failed, 1);
        replaced.will_not_restart = true;
        let mut exhausted = alloc("exhausted", ClientStatus::Failed, 1);
        exhausted.will_not_restart = true;
        exhausted.will_not_reschedule = true;
        let allocs = vec![replaced, alloc("replacement", ClientStatus::Pending, 1), exhausted];

        let block = Classifier::default().classify(&job, &allocs);

        assert_eq!(
            ids(&block, BlockStatus::Pending, Health::HealthUnknown, Cohort::NonCanary),
            vec!["replacement"]
        );
        assert_eq!(
            ids(&block, BlockStatus::Failed, Health::HealthUnknown, Cohort::NonCanary),
            vec!["exhausted"]
        );
        assert_eq!(block.unplaced(), 0);
    }

    #[test]
    fn steady_skips_superseded_too() {
        let job = Job::new("web", JobType::Service).with_group("web", 2);
        let mut replaced = alloc("replaced", ClientStatus::Failed, 1);
        replaced.will_not_restart = true;
        let allocs = vec![replaced, alloc("r1", ClientStatus::Running, 1)];

        let block = Classifier::default().classify(&job, &allocs);

        assert!(block.slots().all(|(_, _, _, s)| s.allocation().map(|a| a.id.as_str()) != Some("replaced")));
        assert_eq!(block.unplaced(), 1);
    }

    #[test]
    fn zero_desired_leaves_everything_empty() {
        let classifier = Classifier::default();
        let allocs = vec![alloc("r1", ClientStatus::Running, 1)];

        for job_type in JobType::ALL {
            let job = Job::new("web", job_type).with_group("web", 0);
            let block = classifier.classify(&job, &allocs);

            assert_eq!(block.total(), 0, "{job_type}");
            assert_eq!(block.unplaced(), 0, "{job_type}");
            for status in classifier.priorities().statuses_for(job_type) {
                assert!(block.contains(*status), "{job_type} missing {status}");
            }
        }
    }

    #[test]
    fn unplaced_placeholders_fill_large_counts() {
        let job = Job::new("web", JobType::Service).with_group("web", 50_000);
        let block = Classifier::default().classify(&job, &[]);

        assert_eq!(block.unplaced(), 50_000);
        assert_eq!(block.total(), 50_000);
    }

    #[test]
    fn custom_priorities_change_backfill_order() {
        let mut priorities = StatusPriorities::default();
        priorities
            .set(
                JobType::Service,
                vec![
                    BlockStatus::Running,
                    BlockStatus::Pending,
                    BlockStatus::Lost,
                    BlockStatus::Failed,
                ],
            )
            .unwrap();
        let job = Job::new("web", JobType::Service).with_group("web", 1);
        let allocs = vec![
            alloc("f1", ClientStatus::Failed, 1),
            alloc("l1", ClientStatus::Lost, 1),
        ];

        let block = Classifier::new(priorities).classify(&job, &allocs);

        assert_eq!(ids(&block, BlockStatus::Lost, Health::Healthy, Cohort::NonCanary), vec!["l1"]);
        assert!(ids(&block, BlockStatus::Failed, Health::Healthy, Cohort::NonCanary).is_empty());
    }

    #[test]
    fn sysbatch_desired_follows_nodes() {
        let job = Job::new("sweep", JobType::Sysbatch);
        let mut a = alloc("a", ClientStatus::Complete, 1);
        a.node_id = Some("n1".to_string());
        let mut b = alloc("b", ClientStatus::Running, 1);
        b.node_id = Some("n2".to_string());
        let allocs = vec![a, b];

        let block = Classifier::default().classify(&job, &allocs);

        assert_eq!(block.desired(), 2);
        assert_eq!(block.healthy_non_canary(BlockStatus::Complete), Some(1));
        assert_eq!(block.healthy_non_canary(BlockStatus::Running), Some(1));
    }
}
