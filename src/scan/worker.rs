use std::path::Path;

use crate::{
    checkpoint::store::CheckpointStore,
    foundation::{
        config::HarnessConfig,
        core::{EvaluationResult, PartitionId, SceneName},
        error::HarnessResult,
    },
    rank::topk::TopKTracker,
    scan::{corpus::list_scenes, denylist::Denylist},
    scene::{evaluator::SceneEvaluator, renderer::SceneRenderer},
};

/// Everything a partition scan reads but never mutates.
pub struct ScanContext<'a, R> {
    /// Run configuration.
    pub config: &'a HarnessConfig,
    /// Scene renderer shared by every worker.
    pub renderer: &'a R,
    /// Scenes to leave out.
    pub denylist: &'a Denylist,
}

impl<R> Clone for ScanContext<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ScanContext<'_, R> {}

/// Per-partition scene counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PartitionStats {
    /// Scene files found.
    pub listed: usize,
    /// Scenes skipped by the denylist.
    pub denied: usize,
    /// Scenes taken from the checkpoint log.
    pub replayed: usize,
    /// Scenes evaluated in this run.
    pub evaluated: usize,
    /// Scenes that failed to decode or allocate.
    pub failed: usize,
}

/// How a partition scan ended.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "error")]
pub enum PartitionStatus {
    /// The partition directory does not exist.
    Skipped,
    /// Every scene was processed.
    Done,
    /// The scan aborted; the message is the error.
    Failed(String),
}

/// Result of scanning one partition.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PartitionSummary {
    /// Partition scanned.
    pub partition: PartitionId,
    /// How the scan ended.
    pub status: PartitionStatus,
    /// Scene counters.
    pub stats: PartitionStats,
}

impl PartitionSummary {
    fn new(partition: PartitionId, status: PartitionStatus, stats: PartitionStats) -> Self {
        Self {
            partition,
            status,
            stats,
        }
    }

    /// Summary of a partition whose scan returned `err`.
    pub fn failed(partition: PartitionId, err: &dyn std::fmt::Display) -> Self {
        Self::new(
            partition,
            PartitionStatus::Failed(err.to_string()),
            PartitionStats::default(),
        )
    }
}

/// Scan every scene of `partition`, offering each result to `tracker`.
///
/// A missing partition directory yields [`PartitionStatus::Skipped`]. Scene decode and allocation
/// failures are logged and counted; checkpoint and I/O errors abort the partition.
#[tracing::instrument(level = "info", skip_all, fields(partition = %partition))]
pub fn scan_partition<R: SceneRenderer>(
    ctx: &ScanContext<'_, R>,
    partition: PartitionId,
    tracker: &mut TopKTracker,
) -> HarnessResult<PartitionSummary> {
    let dir = ctx.config.partition_dir(partition);
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "partition directory missing, skipping");
        return Ok(PartitionSummary::new(
            partition,
            PartitionStatus::Skipped,
            PartitionStats::default(),
        ));
    }

    let scenes = list_scenes(&dir, &ctx.config.scene_extension)?;
    let mut state = PartitionState::open(ctx, partition, tracker)?;
    for scene in &scenes {
        state.process(&dir, scene)?;
    }
    let stats = state.stats;
    tracing::info!(
        listed = stats.listed,
        replayed = stats.replayed,
        evaluated = stats.evaluated,
        failed = stats.failed,
        "partition done"
    );
    Ok(PartitionSummary::new(partition, PartitionStatus::Done, stats))
}

struct PartitionState<'c, 't, R: SceneRenderer> {
    ctx: &'c ScanContext<'c, R>,
    partition: PartitionId,
    evaluator: SceneEvaluator<'c, R>,
    store: CheckpointStore,
    tracker: &'t mut TopKTracker,
    stats: PartitionStats,
}

impl<'c, 't, R: SceneRenderer> PartitionState<'c, 't, R> {
    fn open(
        ctx: &'c ScanContext<'c, R>,
        partition: PartitionId,
        tracker: &'t mut TopKTracker,
    ) -> HarnessResult<Self> {
        let store = CheckpointStore::open(partition, &ctx.config.checkpoint_path(partition))?;
        Ok(Self {
            ctx,
            partition,
            evaluator: SceneEvaluator::new(ctx.renderer, ctx.config),
            store,
            tracker,
            stats: PartitionStats::default(),
        })
    }

    fn process(&mut self, dir: &Path, scene: &SceneName) -> HarnessResult<()> {
        self.stats.listed += 1;
        if self.ctx.denylist.contains(self.partition, scene) {
            tracing::debug!(%scene, "denylisted, skipping");
            self.stats.denied += 1;
            return Ok(());
        }

        if let Some(replayed) = self.store.try_match(scene) {
            self.store.append(&replayed)?;
            self.tracker.offer(&replayed);
            self.stats.replayed += 1;
            tracing::debug!(replayed = true, "{}", replayed.progress());
            return Ok(());
        }

        let eval = match self.evaluator.evaluate(&dir.join(scene.as_str())) {
            Ok(eval) => eval,
            Err(err) if err.is_scene_local() => {
                tracing::warn!(partition = %self.partition, %scene, %err, "scene skipped");
                self.stats.failed += 1;
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let result = EvaluationResult {
            partition: self.partition,
            scene: scene.clone(),
            dissimilarity: eval.dissimilarity,
            timing_delta: eval.timing_delta,
            render_scale: eval.pair.scale,
        };
        self.store.append(&result)?;
        self.stats.evaluated += 1;
        if self.tracker.offer(&result) {
            tracing::info!("{}", result.progress());
        } else {
            tracing::debug!("{}", result.progress());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scan/worker.rs"]
mod tests;
