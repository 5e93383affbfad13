pub mod classify;
pub mod config;
pub mod status;

use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use tracing::debug;

use allocstat_classify::Classifier;
use allocstat_core::{Snapshot, StatusPriorities};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Load the priorities file, or the defaults when none is given.
pub fn load_priorities(config: Option<&str>) -> anyhow::Result<StatusPriorities> {
    match config {
        Some(path) => StatusPriorities::from_file(Path::new(path))
            .with_context(|| format!("loading status priorities from {path}")),
        None => Ok(StatusPriorities::default()),
    }
}

pub fn load(snapshot: &str, config: Option<&str>) -> anyhow::Result<(Snapshot, Classifier)> {
    let snap = Snapshot::from_file(Path::new(snapshot))
        .with_context(|| format!("loading snapshot from {snapshot}"))?;
    debug!(
        job = %snap.job.id,
        allocations = snap.allocations.len(),
        "loaded snapshot"
    );
    let classifier = Classifier::new(load_priorities(config)?);
    Ok((snap, classifier))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::PathBuf;

    pub const SNAPSHOT: &str = r#"{
        "job": {
            "id": "web",
            "type": "service",
            "task_groups": [{"name": "web", "count": 4}]
        },
        "allocations": [
            {"id": "r1", "client_status": "running", "job_version": 2, "is_healthy": true},
            {"id": "r2", "client_status": "running", "job_version": 2, "is_healthy": true},
            {"id": "f1", "client_status": "failed", "job_version": 2},
            {"id": "f0", "client_status": "failed", "job_version": 1}
        ]
    }"#;

    pub fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }
}
