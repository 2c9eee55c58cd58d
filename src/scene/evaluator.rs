use std::{
    path::Path,
    time::{Duration, Instant},
};

use crate::{
    foundation::config::HarnessConfig,
    foundation::error::{HarnessError, HarnessResult},
    metric::similarity::dissimilarity,
    scene::renderer::{ClipRect, ClipStrategy, DrawView, SceneRenderer},
    scene::surface::Surface,
};

/// Downscale factors are tried while strictly below this bound.
pub const MAX_DOWNSCALE: u32 = 256;
/// The timing window is sampled on a `TIMING_SLICES x TIMING_SLICES` grid of offsets.
pub const TIMING_SLICES: u32 = 3;
/// Largest timing window edge, in scene units.
pub const TIMING_WINDOW: u32 = 1000;

/// Both renderings of one scene.
#[derive(Debug)]
pub struct RenderedPair {
    /// Rendering with [`ClipStrategy::Baseline`].
    pub baseline: Surface,
    /// Rendering with [`ClipStrategy::Candidate`].
    pub candidate: Surface,
    /// Downscale the surfaces were allocated at.
    pub scale: u32,
}

/// Full evaluation of one scene.
#[derive(Debug)]
pub struct SceneEvaluation {
    /// The renderings the score was computed from.
    pub pair: RenderedPair,
    /// Metric engine score between the renderings.
    pub dissimilarity: u64,
    /// `max(0, baseline - candidate)` render time, in microseconds.
    pub timing_delta: i64,
}

/// Renders scenes under both strategies and scores the difference.
pub struct SceneEvaluator<'r, R> {
    renderer: &'r R,
    max_surface_pixels: u64,
    background: [u8; 4],
}

impl<'r, R: SceneRenderer> SceneEvaluator<'r, R> {
    /// Evaluator using the surface budget and background from `config`.
    pub fn new(renderer: &'r R, config: &HarnessConfig) -> Self {
        Self::with_limits(renderer, config.max_surface_pixels, config.background_rgba)
    }

    /// Evaluator with explicit limits.
    pub fn with_limits(renderer: &'r R, max_surface_pixels: u64, background: [u8; 4]) -> Self {
        Self {
            renderer,
            max_surface_pixels,
            background,
        }
    }

    /// Decode, time, render and score the scene at `path`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn evaluate(&self, path: &Path) -> HarnessResult<SceneEvaluation> {
        let scene = self.renderer.decode(path)?;
        let size = self.renderer.scene_size(&scene);
        let (mut baseline, mut candidate, scale) =
            allocate_pair(size.0, size.1, self.max_surface_pixels)?;

        baseline.fill(self.background);
        candidate.fill(self.background);
        let baseline_time =
            self.time_draws(&scene, &mut baseline, ClipStrategy::Baseline, size, scale)?;
        let candidate_time =
            self.time_draws(&scene, &mut candidate, ClipStrategy::Candidate, size, scale)?;

        self.render(&scene, &mut baseline, ClipStrategy::Baseline, scale)?;
        self.render(&scene, &mut candidate, ClipStrategy::Candidate, scale)?;

        let score = dissimilarity(baseline.view(), candidate.view());
        Ok(SceneEvaluation {
            pair: RenderedPair {
                baseline,
                candidate,
                scale,
            },
            dissimilarity: score,
            timing_delta: timing_delta(baseline_time, candidate_time),
        })
    }

    /// Decode and render the scene at `path` under both strategies, without timing.
    pub fn render_pair(&self, path: &Path) -> HarnessResult<RenderedPair> {
        let scene = self.renderer.decode(path)?;
        let (w, h) = self.renderer.scene_size(&scene);
        let (mut baseline, mut candidate, scale) = allocate_pair(w, h, self.max_surface_pixels)?;
        self.render(&scene, &mut baseline, ClipStrategy::Baseline, scale)?;
        self.render(&scene, &mut candidate, ClipStrategy::Candidate, scale)?;
        Ok(RenderedPair {
            baseline,
            candidate,
            scale,
        })
    }

    fn render(
        &self,
        scene: &R::Scene,
        target: &mut Surface,
        strategy: ClipStrategy,
        scale: u32,
    ) -> HarnessResult<()> {
        target.fill(self.background);
        let view = DrawView::full(target, scale);
        self.renderer.draw(scene, target, strategy, &view)
    }

    /// Draw the scene on a grid of offsets through a window of at most [`TIMING_WINDOW`] units.
    fn time_draws(
        &self,
        scene: &R::Scene,
        target: &mut Surface,
        strategy: ClipStrategy,
        (width, height): (u32, u32),
        scale: u32,
    ) -> HarnessResult<Duration> {
        let win_w = width.min(TIMING_WINDOW);
        let win_h = height.min(TIMING_WINDOW);
        let x_step = (width - win_w) / (TIMING_SLICES - 1);
        let y_step = (height - win_h) / (TIMING_SLICES - 1);
        let clip = ClipRect {
            x: 0.0,
            y: 0.0,
            width: win_w as f32 / scale as f32,
            height: win_h as f32 / scale as f32,
        };

        let start = Instant::now();
        for i in 0..TIMING_SLICES {
            for j in 0..TIMING_SLICES {
                let view = DrawView {
                    downscale: scale,
                    translate: (-((i * x_step) as f32), -((j * y_step) as f32)),
                    clip,
                };
                self.renderer.draw(scene, target, strategy, &view)?;
            }
        }
        Ok(start.elapsed())
    }
}

/// Allocate two equally sized surfaces for a `width x height` scene.
///
/// Tries downscale 1, 2, 4, ... below [`MAX_DOWNSCALE`] and returns the first that fits, together
/// with that downscale.
pub fn allocate_pair(
    width: u32,
    height: u32,
    max_pixels: u64,
) -> HarnessResult<(Surface, Surface, u32)> {
    let mut scale = 1u32;
    while scale < MAX_DOWNSCALE {
        let (w, h) = (width.div_ceil(scale), height.div_ceil(scale));
        let pair = Surface::try_alloc(w, h, max_pixels)
            .and_then(|a| Ok((a, Surface::try_alloc(w, h, max_pixels)?)));
        match pair {
            Ok((a, b)) => return Ok((a, b, scale)),
            Err(e) => tracing::debug!(scale, error = %e, "surface allocation failed"),
        }
        scale *= 2;
    }
    Err(HarnessError::allocation(format!(
        "no downscale below {MAX_DOWNSCALE} fits a {width}x{height} scene in {max_pixels} pixels"
    )))
}

fn timing_delta(baseline: Duration, candidate: Duration) -> i64 {
    let micros = |d: Duration| i64::try_from(d.as_micros()).unwrap_or(i64::MAX);
    (micros(baseline) - micros(candidate)).max(0)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/evaluator.rs"]
mod tests;
