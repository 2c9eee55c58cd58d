#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use clipscan::{
    ClipStrategy, DrawView, HarnessConfig, HarnessError, HarnessResult, PartitionId, SceneRenderer,
    Surface,
};

/// JSON scene understood by [`BlockRenderer`].
#[derive(serde::Deserialize)]
pub struct BlockScene {
    pub size: u32,
    pub block: u32,
    pub shade: u8,
}

/// The candidate strategy draws a `block`-sized square at (2, 2) that the baseline lacks, so a
/// scene scores `(block - 2)^2 * (255 - shade)`.
#[derive(Default)]
pub struct BlockRenderer {
    decodes: AtomicUsize,
}

impl BlockRenderer {
    pub fn decodes(&self) -> usize {
        self.decodes.load(Ordering::Relaxed)
    }
}

impl SceneRenderer for BlockRenderer {
    type Scene = BlockScene;

    fn decode(&self, path: &Path) -> HarnessResult<Self::Scene> {
        self.decodes.fetch_add(1, Ordering::Relaxed);
        let bytes = std::fs::read(path).map_err(|e| HarnessError::decode(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| HarnessError::decode(e.to_string()))
    }

    fn scene_size(&self, scene: &Self::Scene) -> (u32, u32) {
        (scene.size, scene.size)
    }

    fn draw(
        &self,
        scene: &Self::Scene,
        target: &mut Surface,
        strategy: ClipStrategy,
        view: &DrawView,
    ) -> HarnessResult<()> {
        if strategy == ClipStrategy::Candidate {
            let b = (scene.block / view.downscale) as f32;
            let g = scene.shade;
            target.fill_rect(2.0, 2.0, b, b, [g, g, g, 255]);
        }
        Ok(())
    }
}

pub fn block_scene(block: u32) -> String {
    format!(r#"{{"size": 24, "block": {block}, "shade": 205}}"#)
}

pub fn block_score(block: u32) -> u64 {
    let side = u64::from(block.saturating_sub(2));
    side * side * 50
}

pub fn pid(n: u32) -> PartitionId {
    PartitionId::new(n).unwrap()
}

/// Config rooted at `root` scanning `.json` scenes sequentially.
pub fn config(root: &Path) -> HarnessConfig {
    HarnessConfig {
        corpus_root: root.join("corpus"),
        output_root: root.join("out"),
        scene_extension: "json".to_string(),
        max_partitions: 4,
        max_files: 3,
        parallel: false,
        threads: Some(3),
        ..HarnessConfig::default()
    }
}

/// Write `scenes` as `(file name, body)` into partition `partition`.
pub fn write_partition(cfg: &HarnessConfig, partition: u32, scenes: &[(&str, String)]) -> PathBuf {
    let dir = cfg.partition_dir(pid(partition));
    std::fs::create_dir_all(&dir).unwrap();
    for (name, body) in scenes {
        std::fs::write(dir.join(name), body).unwrap();
    }
    dir
}

/// Partitions 1, 3 and 4 with distinct block sizes; partition 2 is absent and partition 3 holds
/// an undecodable scene.
pub fn standard_corpus(cfg: &HarnessConfig) {
    write_partition(
        cfg,
        1,
        &[
            ("a.json", block_scene(5)),
            ("b.json", block_scene(9)),
            ("c.json", block_scene(0)),
        ],
    );
    write_partition(
        cfg,
        3,
        &[
            ("a.json", block_scene(7)),
            ("broken.json", "{".to_string()),
            ("z.json", block_scene(11)),
        ],
    );
    write_partition(
        cfg,
        4,
        &[("m.json", block_scene(4)), ("n.json", block_scene(8))],
    );
}
