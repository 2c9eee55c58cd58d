//! clipscan is a regression harness for clip simplification in a 2D rasterizer.
//!
//! Every scene of a partitioned corpus is rendered twice, once with the reference clipping path
//! (masked compositing) and once with the simplified one (rounded-out bounded rendering). The two
//! renderings are compared with a noise-tolerant metric and timed, and the worst offenders are
//! kept in bounded rankings and re-rendered to PNG for inspection.
//!
//! # Pipeline overview
//!
//! 1. **Enumerate**: `corpus_root/<prefix><N>/*.<ext>`, sorted by name, minus the denylist.
//! 2. **Replay or evaluate**: a scene already recorded in the partition's checkpoint log is
//!    replayed; anything else goes through [`SceneEvaluator`].
//! 3. **Rank**: every result is offered to a [`TopKTracker`]; concurrent scans merge per-partition
//!    trackers after the join.
//! 4. **Report**: rankings are logged, the worst scenes are written as PNG pairs, and a
//!    [`ScanSummary`] is stored as JSON.
//!
//! Scenes reach the harness through the [`SceneRenderer`] trait; [`SvgRenderer`] is the bundled
//! implementation.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod checkpoint;
mod foundation;
mod metric;
mod rank;
mod report;
mod scan;
mod scene;

pub use checkpoint::store::{
    CheckpointEntry, CheckpointReplay, CheckpointStore, CheckpointWriter, load_checkpoint,
    parse_checkpoint,
};
pub use foundation::config::{
    BASELINE_DIR, CANDIDATE_DIR, HarnessConfig, IMAGE_EXTENSION, STATUS_DIR,
};
pub use foundation::core::{EvaluationResult, MAX_SCENE_NAME_BYTES, PartitionId, SceneName};
pub use foundation::error::{HarnessError, HarnessResult};
pub use metric::similarity::{ERROR_THRESHOLD, PixelView, WINDOW_ROWS, dissimilarity};
pub use rank::topk::{Ranking, TopKList, TopKPolicy, TopKTracker};
pub use report::emit::{
    EmitStats, emit_worst, evaluate_one, log_rankings, write_pair, write_summary,
};
pub use scan::corpus::list_scenes;
pub use scan::denylist::{DenyEntry, Denylist};
pub use scan::fanout::{ScanOutcome, ScanSummary, run_scan, scan_concurrent, scan_sequential};
pub use scan::worker::{
    PartitionStats, PartitionStatus, PartitionSummary, ScanContext, scan_partition,
};
pub use scene::evaluator::{
    MAX_DOWNSCALE, RenderedPair, SceneEvaluation, SceneEvaluator, TIMING_SLICES, TIMING_WINDOW,
    allocate_pair,
};
pub use scene::renderer::{ClipRect, ClipStrategy, DrawView, SceneRenderer};
pub use scene::surface::Surface;
pub use scene::svg::SvgRenderer;
