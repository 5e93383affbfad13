//! Allocation block — allocations bucketed by status, health, and cohort.
//!
//! ```text
//! AllocationBlock
//!   └── BlockStatus (running, pending, failed, ..., unplaced)
//!       └── Health (healthy, unhealthy, health_unknown)
//!           └── Cohort (canary, non_canary) → Vec<Slot>
//! ```
//!
//! Slots borrow from the caller's allocation list; the block never owns or
//! mutates allocation records.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use allocstat_core::{Allocation, BlockStatus, ClientStatus};

/// Deployment health bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Healthy,
    Unhealthy,
    HealthUnknown,
}

impl Health {
    pub const ALL: [Health; 3] = [Health::Healthy, Health::Unhealthy, Health::HealthUnknown];

    /// Health only means something for a running allocation. Health flags
    /// linger after an allocation stops, so anything not running is
    /// `HealthUnknown`.
    pub fn of(alloc: &Allocation) -> Self {
        if alloc.client_status != ClientStatus::Running {
            Health::HealthUnknown
        } else if alloc.is_healthy {
            Health::Healthy
        } else if alloc.is_unhealthy {
            Health::Unhealthy
        } else {
            Health::HealthUnknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Healthy => "healthy",
            Health::Unhealthy => "unhealthy",
            Health::HealthUnknown => "health_unknown",
        }
    }
}

/// Canary or regular allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cohort {
    Canary,
    NonCanary,
}

impl Cohort {
    pub const ALL: [Cohort; 2] = [Cohort::Canary, Cohort::NonCanary];

    pub fn of(alloc: &Allocation) -> Self {
        if alloc.is_canary {
            Cohort::Canary
        } else {
            Cohort::NonCanary
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cohort::Canary => "canary",
            Cohort::NonCanary => "non_canary",
        }
    }
}

/// One entry in a bucket: a real allocation or a placeholder for a
/// desired slot nothing fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    Placed(&'a Allocation),
    Unplaced,
}

impl<'a> Slot<'a> {
    pub fn allocation(&self) -> Option<&'a Allocation> {
        match self {
            Slot::Placed(alloc) => Some(alloc),
            Slot::Unplaced => None,
        }
    }

    pub fn job_version(&self) -> Option<u64> {
        self.allocation().map(|a| a.job_version)
    }

    pub fn is_unplaced(&self) -> bool {
        matches!(self, Slot::Unplaced)
    }
}

impl Serialize for Slot<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Slot::Placed(alloc) => alloc.serialize(serializer),
            Slot::Unplaced => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("client_status", BlockStatus::Unplaced.as_str())?;
                map.end()
            }
        }
    }
}

/// Canary / non-canary split within one health bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CohortBuckets<'a> {
    pub canary: Vec<Slot<'a>>,
    pub non_canary: Vec<Slot<'a>>,
}

impl<'a> CohortBuckets<'a> {
    pub fn get(&self, cohort: Cohort) -> &[Slot<'a>] {
        match cohort {
            Cohort::Canary => &self.canary,
            Cohort::NonCanary => &self.non_canary,
        }
    }

    fn get_mut(&mut self, cohort: Cohort) -> &mut Vec<Slot<'a>> {
        match cohort {
            Cohort::Canary => &mut self.canary,
            Cohort::NonCanary => &mut self.non_canary,
        }
    }

    pub fn len(&self) -> usize {
        self.canary.len() + self.non_canary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Health split for one client status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusBuckets<'a> {
    pub healthy: CohortBuckets<'a>,
    pub unhealthy: CohortBuckets<'a>,
    pub health_unknown: CohortBuckets<'a>,
}

impl<'a> StatusBuckets<'a> {
    pub fn get(&self, health: Health) -> &CohortBuckets<'a> {
        match health {
            Health::Healthy => &self.healthy,
            Health::Unhealthy => &self.unhealthy,
            Health::HealthUnknown => &self.health_unknown,
        }
    }

    fn get_mut(&mut self, health: Health) -> &mut CohortBuckets<'a> {
        match health {
            Health::Healthy => &mut self.healthy,
            Health::Unhealthy => &mut self.unhealthy,
            Health::HealthUnknown => &mut self.health_unknown,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Health, &CohortBuckets<'a>)> {
        Health::ALL.into_iter().map(move |h| (h, self.get(h)))
    }

    pub fn len(&self) -> usize {
        self.iter().map(|(_, c)| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Job version a group of slots was placed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum SlotVersion {
    Known(u64),
    /// Placeholders carry no version.
    Unknown,
}

/// Slot count for one job version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionGroup {
    pub version: SlotVersion,
    pub count: usize,
}

/// Capacity-bounded partition of a job's allocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationBlock<'a> {
    desired: usize,
    statuses: BTreeMap<BlockStatus, StatusBuckets<'a>>,
}

impl<'a> AllocationBlock<'a> {
    /// Empty block with a bucket for each listed status.
    pub(crate) fn with_statuses(desired: usize, statuses: &[BlockStatus]) -> Self {
        Self {
            desired,
            statuses: statuses
                .iter()
                .map(|status| (*status, StatusBuckets::default()))
                .collect(),
        }
    }

    /// Append a slot. Returns false if the block has no bucket for `status`.
    pub(crate) fn push(
        &mut self,
        status: BlockStatus,
        health: Health,
        cohort: Cohort,
        slot: Slot<'a>,
    ) -> bool {
        match self.statuses.get_mut(&status) {
            Some(buckets) => {
                buckets.get_mut(health).get_mut(cohort).push(slot);
                true
            }
            None => false,
        }
    }

    /// Add `count` placeholders to `unplaced.healthy.non_canary`.
    pub(crate) fn fill_unplaced(&mut self, count: usize) {
        let buckets = self.statuses.entry(BlockStatus::Unplaced).or_default();
        buckets
            .healthy
            .non_canary
            .extend(std::iter::repeat_n(Slot::Unplaced, count));
    }

    /// Number of slots the job wants filled.
    pub fn desired(&self) -> usize {
        self.desired
    }

    pub fn get(&self, status: BlockStatus) -> Option<&StatusBuckets<'a>> {
        self.statuses.get(&status)
    }

    pub fn contains(&self, status: BlockStatus) -> bool {
        self.statuses.contains_key(&status)
    }

    pub fn statuses(&self) -> impl Iterator<Item = BlockStatus> + '_ {
        self.statuses.keys().copied()
    }

    pub fn bucket(&self, status: BlockStatus, health: Health, cohort: Cohort) -> &[Slot<'a>] {
        self.statuses
            .get(&status)
            .map(|b| b.get(health).get(cohort))
            .unwrap_or(&[])
    }

    pub fn count(&self, status: BlockStatus, health: Health, cohort: Cohort) -> usize {
        self.bucket(status, health, cohort).len()
    }

    /// Size of `status.healthy.non_canary`, or `None` if the block has no
    /// bucket for `status`.
    pub fn healthy_non_canary(&self, status: BlockStatus) -> Option<usize> {
        self.get(status).map(|b| b.healthy.non_canary.len())
    }

    pub fn unplaced(&self) -> usize {
        self.healthy_non_canary(BlockStatus::Unplaced).unwrap_or(0)
    }

    /// Every slot in the block, placeholders included.
    pub fn total(&self) -> usize {
        self.statuses.values().map(StatusBuckets::len).sum()
    }

    /// Walk every slot in status, health, cohort order.
    pub fn slots(&self) -> impl Iterator<Item = (BlockStatus, Health, Cohort, &Slot<'a>)> + '_ {
        self.statuses.iter().flat_map(|(status, buckets)| {
            buckets.iter().flat_map(move |(health, cohorts)| {
                Cohort::ALL.into_iter().flat_map(move |cohort| {
                    cohorts
                        .get(cohort)
                        .iter()
                        .map(move |slot| (*status, health, cohort, slot))
                })
            })
        })
    }

    pub fn has_canaries(&self) -> bool {
        self.statuses
            .values()
            .any(|b| b.iter().any(|(_, cohorts)| !cohorts.canary.is_empty()))
    }

    /// Slot counts grouped by job version, ascending, placeholders last.
    pub fn versions(&self) -> Vec<VersionGroup> {
        let mut counts: BTreeMap<SlotVersion, usize> = BTreeMap::new();
        for (_, _, _, slot) in self.slots() {
            let version = slot
                .job_version()
                .map(SlotVersion::Known)
                .unwrap_or(SlotVersion::Unknown);
            *counts.entry(version).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(version, count)| VersionGroup { version, count })
            .collect()
    }
}
