use rayon::prelude::*;

use crate::{
    foundation::{
        core::{EvaluationResult, PartitionId},
        error::{HarnessError, HarnessResult},
    },
    rank::topk::TopKTracker,
    scan::worker::{PartitionStats, PartitionStatus, PartitionSummary, ScanContext, scan_partition},
    scene::renderer::SceneRenderer,
};

/// Final rankings of a scan plus what happened in each partition.
#[derive(Clone, Debug)]
pub struct ScanOutcome {
    /// Global worst and slowest lists.
    pub tracker: TopKTracker,
    /// One summary per partition, in partition order.
    pub partitions: Vec<PartitionSummary>,
}

impl ScanOutcome {
    /// Serializable view of the outcome, rankings sorted largest first.
    pub fn summary(&self) -> ScanSummary {
        let mut totals = PartitionStats::default();
        for p in &self.partitions {
            totals.listed += p.stats.listed;
            totals.denied += p.stats.denied;
            totals.replayed += p.stats.replayed;
            totals.evaluated += p.stats.evaluated;
            totals.failed += p.stats.failed;
        }
        let count = |f: fn(&PartitionStatus) -> bool| {
            self.partitions.iter().filter(|p| f(&p.status)).count()
        };
        ScanSummary {
            partitions_done: count(|s| matches!(s, PartitionStatus::Done)),
            partitions_skipped: count(|s| matches!(s, PartitionStatus::Skipped)),
            partitions_failed: count(|s| matches!(s, PartitionStatus::Failed(_))),
            totals,
            worst: self.tracker.worst().sorted_desc(),
            slowest: self.tracker.slowest().sorted_desc(),
            partitions: self.partitions.clone(),
        }
    }
}

/// Run summary persisted next to the emitted images.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScanSummary {
    /// Partitions scanned to the end.
    pub partitions_done: usize,
    /// Partitions without an input directory.
    pub partitions_skipped: usize,
    /// Partitions aborted by an error.
    pub partitions_failed: usize,
    /// Scene counters summed over all partitions.
    pub totals: PartitionStats,
    /// Worst-dissimilarity list, largest first.
    pub worst: Vec<EvaluationResult>,
    /// Largest-timing-delta list, largest first.
    pub slowest: Vec<EvaluationResult>,
    /// Per-partition detail.
    pub partitions: Vec<PartitionSummary>,
}

/// Scan with the mode selected by `config.parallel`.
pub fn run_scan<R: SceneRenderer>(ctx: &ScanContext<'_, R>) -> HarnessResult<ScanOutcome> {
    if ctx.config.parallel {
        scan_concurrent(ctx)
    } else {
        scan_sequential(ctx)
    }
}

/// Scan partitions one after another against a single tracker.
pub fn scan_sequential<R: SceneRenderer>(ctx: &ScanContext<'_, R>) -> HarnessResult<ScanOutcome> {
    ctx.config.prepare_output_dirs()?;
    tracing::info!(
        partitions = ctx.config.max_partitions,
        "scanning sequentially"
    );

    let mut tracker = new_tracker(ctx);
    let partitions = PartitionId::range(ctx.config.max_partitions)
        .map(|p| run_partition(ctx, p, &mut tracker))
        .collect();
    Ok(ScanOutcome {
        tracker,
        partitions,
    })
}

/// Scan partitions on a thread pool, each with a private tracker, then merge in partition order.
pub fn scan_concurrent<R: SceneRenderer>(ctx: &ScanContext<'_, R>) -> HarnessResult<ScanOutcome> {
    ctx.config.prepare_output_dirs()?;
    let pool = build_thread_pool(ctx.config.threads)?;
    tracing::info!(
        partitions = ctx.config.max_partitions,
        threads = pool.current_num_threads(),
        "scanning concurrently"
    );

    let ids: Vec<PartitionId> = PartitionId::range(ctx.config.max_partitions).collect();
    let per_partition: Vec<(PartitionSummary, TopKTracker)> = pool.install(|| {
        ids.par_iter()
            .map(|&p| {
                let mut local = new_tracker(ctx);
                let summary = run_partition(ctx, p, &mut local);
                (summary, local)
            })
            .collect()
    });

    let mut tracker = new_tracker(ctx);
    let mut partitions = Vec::with_capacity(per_partition.len());
    for (summary, local) in per_partition {
        tracker.merge_from(&local);
        partitions.push(summary);
    }
    Ok(ScanOutcome {
        tracker,
        partitions,
    })
}

fn new_tracker<R>(ctx: &ScanContext<'_, R>) -> TopKTracker {
    TopKTracker::new(ctx.config.max_files, ctx.config.topk_policy)
}

fn run_partition<R: SceneRenderer>(
    ctx: &ScanContext<'_, R>,
    partition: PartitionId,
    tracker: &mut TopKTracker,
) -> PartitionSummary {
    match scan_partition(ctx, partition, tracker) {
        Ok(summary) => summary,
        Err(err) => {
            tracing::error!(%partition, %err, "partition scan failed");
            PartitionSummary::failed(partition, &err)
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> HarnessResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(HarnessError::validation("'threads' must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("clipscan-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build rayon thread pool: {e}").into())
}

#[cfg(test)]
#[path = "../../tests/unit/scan/fanout.rs"]
mod tests;
