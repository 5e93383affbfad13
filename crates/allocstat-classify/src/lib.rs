//! allocstat-classify — allocation classification and job status.
//!
//! Turns a job's allocation list into a capacity-bounded block of
//! `(status × health × canary)` buckets, then derives one status label
//! for the whole job. Both steps are pure and recomputed per snapshot.
//!
//! # Components
//!
//! - **`classifier`** — Fills desired slots from allocations (deploying / steady state)
//! - **`block`** — The bucketed `AllocationBlock` and its slot types
//! - **`status`** — Aggregate status label and severity
//! - **`promotion`** — Canary promotion eligibility
//! - **`summary`** — Current-version allocation counts
//! - **`cache`** — Snapshot fingerprints and a memoizing status cache

pub mod block;
pub mod cache;
pub mod classifier;
pub mod promotion;
pub mod status;
pub mod summary;

pub use block::{AllocationBlock, Cohort, CohortBuckets, Health, Slot, SlotVersion, StatusBuckets, VersionGroup};
pub use cache::{SnapshotFingerprint, StatusCache};
pub use classifier::Classifier;
pub use promotion::{PromotionState, canaries_healthy, has_active_canaries, promotion_state, some_canaries_failed};
pub use status::{JobStatus, StatusLabel, StatusState, aggregate_status};
pub use summary::AllocationSummary;
