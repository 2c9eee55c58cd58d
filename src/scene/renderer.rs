use std::path::Path;

use crate::{foundation::error::HarnessResult, scene::surface::Surface};

/// Which clipping implementation a draw goes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipStrategy {
    /// Clip simplification disabled (the reference rendering).
    Baseline,
    /// Clip simplification enabled (the rendering under test).
    Candidate,
}

/// Device-space clip rectangle, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl ClipRect {
    /// Rectangle covering a whole `width x height` surface.
    pub fn covering(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
        }
    }
}

/// Placement of one scene draw on a surface.
///
/// Scene coordinates map to device coordinates as `device = (scene + translate) / downscale`,
/// and nothing outside `clip` is touched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawView {
    /// Power-of-two downscale factor (>= 1).
    pub downscale: u32,
    /// Offset applied in scene units before downscaling.
    pub translate: (f32, f32),
    /// Device-space clip.
    pub clip: ClipRect,
}

impl DrawView {
    /// Whole-scene draw at `downscale`, clipped to the target.
    pub fn full(target: &Surface, downscale: u32) -> Self {
        Self {
            downscale,
            translate: (0.0, 0.0),
            clip: ClipRect::covering(target.width(), target.height()),
        }
    }
}

/// The rendering engine the harness drives.
///
/// Implementations decode scenes and draw them under either [`ClipStrategy`]. Draws must not
/// touch global state; partitions call into one shared renderer from many threads.
pub trait SceneRenderer: Sync {
    /// A decoded scene.
    type Scene;

    /// Read and decode the scene at `path`. Failures should be [`HarnessError::Decode`].
    ///
    /// [`HarnessError::Decode`]: crate::HarnessError::Decode
    fn decode(&self, path: &Path) -> HarnessResult<Self::Scene>;

    /// Logical `(width, height)` of the scene, in scene units.
    fn scene_size(&self, scene: &Self::Scene) -> (u32, u32);

    /// Draw `scene` onto `target` with the given strategy and placement.
    fn draw(
        &self,
        scene: &Self::Scene,
        target: &mut Surface,
        strategy: ClipStrategy,
        view: &DrawView,
    ) -> HarnessResult<()>;
}
