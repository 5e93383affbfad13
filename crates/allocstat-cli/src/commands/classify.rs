//! `allocstat classify` — print the allocation block for a snapshot.

use allocstat_classify::{AllocationBlock, Cohort, SlotVersion};
use allocstat_core::Job;

use super::OutputFormat;

pub fn run(snapshot: &str, config: Option<&str>, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render(snapshot, config, format)?);
    Ok(())
}

pub fn render(snapshot: &str, config: Option<&str>, format: OutputFormat) -> anyhow::Result<String> {
    let (snap, classifier) = super::load(snapshot, config)?;
    let block = classifier.classify(&snap.job, &snap.allocations);

    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&block)?,
        OutputFormat::Text => format_block(&snap.job, &block),
    })
}

pub fn format_block(job: &Job, block: &AllocationBlock<'_>) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Job {} ({}): {} desired, {} unplaced\n",
        job.id,
        job.job_type,
        block.desired(),
        block.unplaced()
    ));

    for status in block.statuses() {
        let Some(buckets) = block.get(status) else {
            continue;
        };
        out.push_str(&format!("\n{status} ({})\n", buckets.len()));
        for (health, cohorts) in buckets.iter() {
            for cohort in Cohort::ALL {
                let slots = cohorts.get(cohort);
                if slots.is_empty() {
                    continue;
                }
                let ids: Vec<&str> = slots
                    .iter()
                    .map(|s| s.allocation().map_or("-", |a| a.id.as_str()))
                    .collect();
                out.push_str(&format!(
                    "  {:<15} {:<11} {}\n",
                    health.as_str(),
                    cohort.as_str(),
                    ids.join(", ")
                ));
            }
        }
    }

    let versions: Vec<String> = block
        .versions()
        .iter()
        .map(|g| match g.version {
            SlotVersion::Known(v) => format!("v{v}×{}", g.count),
            SlotVersion::Unknown => format!("unknown×{}", g.count),
        })
        .collect();
    if !versions.is_empty() {
        out.push_str(&format!("\nVersions: {}\n", versions.join("  ")));
    }

    out
}
