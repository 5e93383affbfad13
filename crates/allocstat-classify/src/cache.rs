//! Snapshot fingerprints and a memoizing status cache.
//!
//! Classification is cheap, but status lists poll many jobs at once. The
//! cache keeps the last status per job and only reclassifies when the
//! snapshot fingerprint changes.

use std::collections::HashMap;
use std::fmt;

use sha2::{Digest, Sha256};
use tracing::debug;

use allocstat_core::{Allocation, Job};

use crate::classifier::Classifier;
use crate::status::{JobStatus, aggregate_status};

/// Content hash of a job and its allocation list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotFingerprint(String);

impl SnapshotFingerprint {
    /// Hash the JSON encoding of `job` and `allocations`. Allocation order
    /// is significant, as it is to the classifier.
    pub fn compute(job: &Job, allocations: &[Allocation]) -> Result<Self, serde_json::Error> {
        let encoded = serde_json::to_vec(&(job, allocations))?;
        let digest = Sha256::digest(&encoded);
        Ok(Self(format!("sha256:{}", hex::encode(&digest[..16]))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct CachedStatus {
    fingerprint: SnapshotFingerprint,
    status: JobStatus,
}

/// Last computed status per job id.
#[derive(Debug, Default)]
pub struct StatusCache {
    classifier: Classifier,
    entries: HashMap<String, CachedStatus>,
}

impl StatusCache {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            entries: HashMap::new(),
        }
    }

    /// Status for the snapshot, reusing the cached value when nothing in
    /// the job or its allocations changed.
    pub fn status(
        &mut self,
        job: &Job,
        allocations: &[Allocation],
    ) -> Result<JobStatus, serde_json::Error> {
        let fingerprint = SnapshotFingerprint::compute(job, allocations)?;
        if let Some(cached) = self
            .entries
            .get(&job.id)
            .filter(|c| c.fingerprint == fingerprint)
        {
            return Ok(cached.status);
        }

        let block = self.classifier.classify(job, allocations);
        let status = aggregate_status(job, &block);
        debug!(job = %job.id, %fingerprint, label = %status.label, "status cache miss");
        self.entries
            .insert(job.id.clone(), CachedStatus { fingerprint, status });
        Ok(status)
    }

    pub fn invalidate(&mut self, job_id: &str) -> bool {
        self.entries.remove(job_id).is_some()
    }

    /// Drop entries for jobs not in `live`. Entries are only ever evicted
    /// here or by [`invalidate`](Self::invalidate), so long-lived callers
    /// should call this after each poll with the job ids still present.
    pub fn retain(&mut self, live: &[&str]) {
        let before = self.entries.len();
        self.entries.retain(|id, _| live.contains(&id.as_str()));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.entries.len(), "evicted stale status entries");
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusLabel;
    use allocstat_core::{ClientStatus, JobType};

    fn alloc(id: &str, status: ClientStatus) -> Allocation {
        Allocation {
            id: id.to_string(),
            client_status: status,
            job_version: 0,
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

    #[test]
    fn fingerprint_is_stable_and_order_sensitive() {
        let job = Job::new("web", JobType::Service).with_group("web", 2);
        let a = vec![alloc("a", ClientStatus::Running), alloc("b", ClientStatus::Failed)];
        let b = vec![alloc("b", ClientStatus::Failed), alloc("a", ClientStatus::Running)];

        let fa = SnapshotFingerprint::compute(&job, &a).unwrap();
        assert_eq!(fa, SnapshotFingerprint::compute(&job, &a).unwrap());
        assert_ne!(fa, SnapshotFingerprint::compute(&job, &b).unwrap());
        assert!(fa.as_str().starts_with("sha256:"));
        assert_eq!(fa.as_str().len(), "sha256:".len() + 32);
    }

    #[test]
    fn cache_recomputes_on_change() {
        let job = Job::new("web", JobType::Service).with_group("web", 1);
        let mut cache = StatusCache::default();

        let allocs = vec![alloc("a", ClientStatus::Running)];
        assert_eq!(cache.status(&job, &allocs).unwrap().label, StatusLabel::Healthy);
        assert_eq!(cache.status(&job, &allocs).unwrap().label, StatusLabel::Healthy);
        assert_eq!(cache.len(), 1);

        let allocs = vec![alloc("a", ClientStatus::Failed)];
        assert_eq!(cache.status(&job, &allocs).unwrap().label, StatusLabel::Failed);
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate("web"));
        assert!(!cache.invalidate("web"));
        assert!(cache.is_empty());
    }

    #[test]
    fn retain_evicts_jobs_no_longer_polled() {
        let web = Job::new("web", JobType::Service).with_group("web", 1);
        let api = Job::new("api", JobType::Service).with_group("api", 1);
        let allocs = vec![alloc("a", ClientStatus::Running)];
        let mut cache = StatusCache::default();

        cache.status(&web, &allocs).unwrap();
        cache.status(&api, &allocs).unwrap();
        assert_eq!(cache.len(), 2);

        cache.retain(&["api"]);
        assert_eq!(cache.len(), 1);
        assert!(!cache.invalidate("web"));
        assert!(cache.invalidate("api"));

        cache.status(&web, &allocs).unwrap();
        cache.retain(&[]);
        assert!(cache.is_empty());
    }
}
