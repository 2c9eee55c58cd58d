use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    foundation::core::PartitionId,
    foundation::error::{HarnessError, HarnessResult},
    rank::topk::TopKPolicy,
    scan::denylist::DenyEntry,
};

/// Directory under `output_root` holding one checkpoint log per partition.
pub const STATUS_DIR: &str = "status";
/// Directory under `output_root` receiving baseline renderings of the worst scenes.
pub const BASELINE_DIR: &str = "baseline";
/// Directory under `output_root` receiving candidate renderings of the worst scenes.
pub const CANDIDATE_DIR: &str = "candidate";
/// Extension of emitted images.
pub const IMAGE_EXTENSION: &str = "png";

/// Harness configuration.
///
/// Every field has a default, so a JSON file only needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Root directory holding the partition directories.
    pub corpus_root: PathBuf,
    /// Partition `N` lives in `corpus_root/<partition_prefix><N>`.
    pub partition_prefix: String,
    /// Root for checkpoint logs, emitted images and the run summary.
    pub output_root: PathBuf,
    /// Extension (without dot) of scene files.
    pub scene_extension: String,
    /// Partitions `1..=max_partitions` are scanned.
    pub max_partitions: u32,
    /// Capacity of each ranked list.
    pub max_files: usize,
    /// Replacement policy of the ranked lists.
    pub topk_policy: TopKPolicy,
    /// Scan partitions concurrently.
    pub parallel: bool,
    /// Worker thread count for concurrent scans; `None` uses one per core.
    pub threads: Option<usize>,
    /// Largest surface, in pixels, the evaluator tries to allocate.
    pub max_surface_pixels: u64,
    /// Uniform fill applied to surfaces before drawing (straight RGBA8).
    pub background_rgba: [u8; 4],
    /// Extra `(partition, scene)` pairs to leave out of the scan.
    pub denylist: Vec<DenyEntry>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            corpus_root: PathBuf::from("/skp"),
            partition_prefix: "slave".to_string(),
            output_root: PathBuf::from("/skpOut/1"),
            scene_extension: "svg".to_string(),
            max_partitions: 100,
            max_files: 128,
            topk_policy: TopKPolicy::default(),
            parallel: true,
            threads: None,
            max_surface_pixels: 1 << 28,
            background_rgba: [255, 255, 255, 255],
            denylist: Vec::new(),
        }
    }
}

impl HarnessConfig {
    /// Read a JSON config file.
    pub fn from_json_path(path: &Path) -> HarnessResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config JSON '{}'", path.display()))?;
        Ok(cfg)
    }

    /// Reject values the harness cannot run with.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.max_partitions == 0 {
            return Err(HarnessError::validation("max_partitions must be >= 1"));
        }
        if self.max_files == 0 {
            return Err(HarnessError::validation("max_files must be >= 1"));
        }
        if matches!(self.threads, Some(0)) {
            return Err(HarnessError::validation("threads must be >= 1 when set"));
        }
        if self.max_surface_pixels == 0 {
            return Err(HarnessError::validation("max_surface_pixels must be >= 1"));
        }
        let ext = self.scene_extension.as_str();
        if ext.is_empty() || ext.contains('.') || ext.contains('/') {
            return Err(HarnessError::validation(format!(
                "scene_extension must be a bare extension, got '{ext}'"
            )));
        }
        Ok(())
    }

    /// Input directory of `partition`.
    pub fn partition_dir(&self, partition: PartitionId) -> PathBuf {
        self.corpus_root
            .join(format!("{}{partition}", self.partition_prefix))
    }

    /// Checkpoint log of `partition`.
    pub fn checkpoint_path(&self, partition: PartitionId) -> PathBuf {
        self.output_root
            .join(STATUS_DIR)
            .join(format!("stats{partition}.txt"))
    }

    /// Directory receiving baseline images.
    pub fn baseline_dir(&self) -> PathBuf {
        self.output_root.join(BASELINE_DIR)
    }

    /// Directory receiving candidate images.
    pub fn candidate_dir(&self) -> PathBuf {
        self.output_root.join(CANDIDATE_DIR)
    }

    /// Path of the JSON run summary.
    pub fn summary_path(&self) -> PathBuf {
        self.output_root.join("summary.json")
    }

    /// Create the output tree. Safe to race with other processes creating the same directories.
    pub fn prepare_output_dirs(&self) -> HarnessResult<()> {
        for dir in [
            self.output_root.join(STATUS_DIR),
            self.baseline_dir(),
            self.candidate_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create output dir '{}'", dir.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
