//! Output stage of a scan: images of the worst scenes, ranking logs and the JSON summary.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    foundation::{
        config::{HarnessConfig, IMAGE_EXTENSION},
        core::{EvaluationResult, PartitionId, SceneName},
        error::{HarnessError, HarnessResult},
    },
    rank::topk::{TopKList, TopKTracker},
    scan::{fanout::ScanSummary, worker::ScanContext},
    scene::{
        evaluator::{RenderedPair, SceneEvaluator},
        renderer::SceneRenderer,
        surface::Surface,
    },
};

/// Image emission counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmitStats {
    /// Scenes whose two images were written.
    pub written: usize,
    /// Scenes that failed to render or encode.
    pub failed: usize,
}

/// Re-render every scene in `worst` and write its baseline and candidate PNGs.
///
/// Failures are logged and counted; emission carries on with the next scene.
pub fn emit_worst<R: SceneRenderer>(
    ctx: &ScanContext<'_, R>,
    worst: &[EvaluationResult],
) -> EmitStats {
    let evaluator = SceneEvaluator::new(ctx.renderer, ctx.config);
    let mut stats = EmitStats::default();
    for r in worst {
        let path = scene_path(ctx.config, r.partition, &r.scene);
        let written = evaluator
            .render_pair(&path)
            .and_then(|pair| write_pair(ctx.config, &r.scene, &pair));
        match written {
            Ok(_) => stats.written += 1,
            Err(err) => {
                tracing::warn!(partition = %r.partition, scene = %r.scene, %err, "emit failed");
                stats.failed += 1;
            }
        }
    }
    tracing::info!(written = stats.written, failed = stats.failed, "images emitted");
    stats
}

/// Write both renderings of `scene` as `<stem>.png` under the baseline and candidate dirs.
pub fn write_pair(
    config: &HarnessConfig,
    scene: &SceneName,
    pair: &RenderedPair,
) -> HarnessResult<(PathBuf, PathBuf)> {
    let file = scene.with_extension(IMAGE_EXTENSION);
    let baseline = config.baseline_dir().join(&file);
    let candidate = config.candidate_dir().join(&file);
    write_png(&baseline, &pair.baseline)?;
    write_png(&candidate, &pair.candidate)?;
    Ok((baseline, candidate))
}

fn write_png(path: &Path, surface: &Surface) -> HarnessResult<()> {
    image::save_buffer_with_format(
        path,
        &surface.to_straight_rgba8(),
        surface.width(),
        surface.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| HarnessError::encode(format!("write png '{}': {e}", path.display())))
}

/// Log both rankings, largest key first.
pub fn log_rankings(tracker: &TopKTracker) {
    log_list(tracker.worst());
    log_list(tracker.slowest());
}

fn log_list(list: &TopKList) {
    let label = list.ranking().label();
    tracing::info!(ranking = label, count = list.len(), "ranking");
    for r in list.sorted_desc() {
        tracing::info!(
            ranking = label,
            "{} {} {}",
            r.partition,
            r.scene,
            list.ranking().key(&r)
        );
    }
}

/// Persist `summary` as pretty JSON at [`HarnessConfig::summary_path`].
pub fn write_summary(config: &HarnessConfig, summary: &ScanSummary) -> HarnessResult<PathBuf> {
    let path = config.summary_path();
    let json = serde_json::to_vec_pretty(summary).context("serialize scan summary")?;
    std::fs::write(&path, json)
        .with_context(|| format!("write summary '{}'", path.display()))?;
    Ok(path)
}

/// Evaluate one scene outside a scan and write its two images.
///
/// Nothing is read from or written to the checkpoint logs.
pub fn evaluate_one<R: SceneRenderer>(
    ctx: &ScanContext<'_, R>,
    partition: PartitionId,
    scene: &SceneName,
) -> HarnessResult<EvaluationResult> {
    ctx.config.prepare_output_dirs()?;
    let path = scene_path(ctx.config, partition, scene);
    let eval = SceneEvaluator::new(ctx.renderer, ctx.config).evaluate(&path)?;
    let result = EvaluationResult {
        partition,
        scene: scene.clone(),
        dissimilarity: eval.dissimilarity,
        timing_delta: eval.timing_delta,
        render_scale: eval.pair.scale,
    };
    tracing::info!("{}", result.progress());
    write_pair(ctx.config, scene, &eval.pair)?;
    Ok(result)
}

fn scene_path(config: &HarnessConfig, partition: PartitionId, scene: &SceneName) -> PathBuf {
    config.partition_dir(partition).join(scene.as_str())
}

#[cfg(test)]
#[path = "../../tests/unit/report/emit.rs"]
mod tests;
