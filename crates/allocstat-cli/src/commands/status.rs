//! `allocstat status` — aggregate status, promotion state, and counts.

use serde::Serialize;

use allocstat_classify::{
    AllocationSummary, JobStatus, PromotionState, SnapshotFingerprint, aggregate_status,
    promotion_state,
};

use super::OutputFormat;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub job: String,
    pub fingerprint: String,
    pub status: JobStatus,
    pub promotion: PromotionState,
    pub deployment_failed: bool,
    pub summary: AllocationSummary,
}

pub fn run(snapshot: &str, config: Option<&str>, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render(snapshot, config, format)?);
    Ok(())
}

pub fn build_report(snapshot: &str, config: Option<&str>) -> anyhow::Result<StatusReport> {
    let (snap, classifier) = super::load(snapshot, config)?;
    let block = classifier.classify(&snap.job, &snap.allocations);

    Ok(StatusReport {
        job: snap.job.id.clone(),
        fingerprint: SnapshotFingerprint::compute(&snap.job, &snap.allocations)?.to_string(),
        status: aggregate_status(&snap.job, &block),
        promotion: promotion_state(&snap.job, &snap.allocations, &block),
        deployment_failed: snap.job.latest_deployment.is_failed(),
        summary: AllocationSummary::from_allocations(&snap.job, &snap.allocations),
    })
}

pub fn render(snapshot: &str, config: Option<&str>, format: OutputFormat) -> anyhow::Result<String> {
    let report = build_report(snapshot, config)?;
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Text => format_report(&report),
    })
}

pub fn format_report(report: &StatusReport) -> String {
    let mut out = String::new();
    let summary = &report.summary;

    out.push_str(&format!(
        "Job {}: {} ({})\n",
        report.job, report.status.label, report.status.state
    ));

    match report.promotion {
        PromotionState::NotRequired => {}
        PromotionState::Promote => out.push_str("Canaries healthy: ready to promote\n"),
        PromotionState::CanaryFailed => out.push_str("Canary failure: promotion blocked\n"),
        PromotionState::AwaitingCanaries { auto_promote: true } => {
            out.push_str("Canaries settling: will auto-promote\n")
        }
        PromotionState::AwaitingCanaries { auto_promote: false } => {
            out.push_str("Canaries settling: manual promotion required\n")
        }
    }
    if report.deployment_failed {
        out.push_str("Latest deployment failed\n");
    }

    out.push_str(&format!(
        "Allocations: {} desired, {} current version, {} complete\n",
        summary.desired, summary.latest_version, summary.completed
    ));
    if summary.all_complete() {
        out.push_str("  all allocations complete\n");
    } else {
        out.push_str(&format!("  {} not yet complete\n", summary.non_completed()));
    }
    if summary.supports_rescheduling {
        out.push_str(&format!("  {} rescheduled\n", summary.rescheduled));
    }
    out.push_str(&format!("  {} restarted\n", summary.restarted));
    out.push_str(&format!("Fingerprint: {}\n", report.fingerprint));

    out
}
