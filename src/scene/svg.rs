use std::{path::Path, sync::Arc};

use resvg::tiny_skia;

use crate::{
    foundation::error::{HarnessError, HarnessResult},
    scene::renderer::{ClipRect, ClipStrategy, DrawView, SceneRenderer},
    scene::surface::Surface,
};

/// [`SceneRenderer`] for SVG scenes, rasterized with `resvg`.
///
/// - [`ClipStrategy::Baseline`] renders the scene over the whole target into a scratch surface
///   and composites it through a rasterized coverage mask of the clip.
/// - [`ClipStrategy::Candidate`] rounds the clip out to device pixels, renders only that region
///   and composites it without a mask. Empty clips draw nothing.
pub struct SvgRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl SvgRenderer {
    /// Renderer resolving text against the system fonts.
    pub fn with_system_fonts() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Renderer without any fonts; text nodes render nothing.
    pub fn without_fonts() -> Self {
        Self {
            fontdb: Arc::new(usvg::fontdb::Database::new()),
        }
    }

    fn draw_masked(
        &self,
        tree: &usvg::Tree,
        target: &mut Surface,
        base: tiny_skia::Transform,
        clip: &ClipRect,
    ) -> HarnessResult<()> {
        let (w, h) = (target.width(), target.height());
        let Some(rect) = tiny_skia::Rect::from_xywh(clip.x, clip.y, clip.width, clip.height)
        else {
            return Ok(());
        };

        let mut scratch = Surface::try_alloc(w, h, u64::from(w) * u64::from(h))?;
        resvg::render(tree, base, &mut scratch.pixmap_mut().as_mut());

        let mut mask = tiny_skia::Mask::new(w, h)
            .ok_or_else(|| HarnessError::allocation(format!("clip mask {w}x{h}")))?;
        mask.fill_path(
            &tiny_skia::PathBuilder::from_rect(rect),
            tiny_skia::FillRule::Winding,
            true,
            tiny_skia::Transform::identity(),
        );

        target.pixmap_mut().draw_pixmap(
            0,
            0,
            scratch.pixmap().as_ref(),
            &tiny_skia::PixmapPaint::default(),
            tiny_skia::Transform::identity(),
            Some(&mask),
        );
        Ok(())
    }

    fn draw_bounded(
        &self,
        tree: &usvg::Tree,
        target: &mut Surface,
        base: tiny_skia::Transform,
        clip: &ClipRect,
    ) -> HarnessResult<()> {
        let Some((x, y, w, h)) = device_bounds(clip, target.width(), target.height()) else {
            return Ok(());
        };

        let mut scratch = Surface::try_alloc(w, h, u64::from(w) * u64::from(h))?;
        let xform = tiny_skia::Transform::from_translate(-(x as f32), -(y as f32)).pre_concat(base);
        resvg::render(tree, xform, &mut scratch.pixmap_mut().as_mut());

        target.pixmap_mut().draw_pixmap(
            x,
            y,
            scratch.pixmap().as_ref(),
            &tiny_skia::PixmapPaint::default(),
            tiny_skia::Transform::identity(),
            None,
        );
        Ok(())
    }
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self::with_system_fonts()
    }
}

impl SceneRenderer for SvgRenderer {
    type Scene = usvg::Tree;

    fn decode(&self, path: &Path) -> HarnessResult<Self::Scene> {
        let bytes = std::fs::read(path)
            .map_err(|e| HarnessError::decode(format!("read '{}': {e}", path.display())))?;
        let opts = usvg::Options {
            resources_dir: path.parent().map(Path::to_path_buf),
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };
        usvg::Tree::from_data(&bytes, &opts)
            .map_err(|e| HarnessError::decode(format!("parse '{}': {e}", path.display())))
    }

    fn scene_size(&self, scene: &Self::Scene) -> (u32, u32) {
        let size = scene.size();
        let px = |v: f32| (v.ceil() as u32).max(1);
        (px(size.width()), px(size.height()))
    }

    fn draw(
        &self,
        scene: &Self::Scene,
        target: &mut Surface,
        strategy: ClipStrategy,
        view: &DrawView,
    ) -> HarnessResult<()> {
        let s = 1.0 / view.downscale.max(1) as f32;
        let base = tiny_skia::Transform::from_scale(s, s)
            .pre_translate(view.translate.0, view.translate.1);
        match strategy {
            ClipStrategy::Baseline => self.draw_masked(scene, target, base, &view.clip),
            ClipStrategy::Candidate => self.draw_bounded(scene, target, base, &view.clip),
        }
    }
}

/// Clip rounded out to whole pixels and intersected with a `width x height` target.
fn device_bounds(clip: &ClipRect, width: u32, height: u32) -> Option<(i32, i32, u32, u32)> {
    let (l, t) = (clip.x, clip.y);
    let (r, b) = (clip.x + clip.width, clip.y + clip.height);
    if ![l, t, r, b].iter().all(|v| v.is_finite()) {
        return None;
    }
    let x0 = l.floor().max(0.0) as i64;
    let y0 = t.floor().max(0.0) as i64;
    let x1 = (r.ceil() as i64).min(i64::from(width));
    let y1 = (b.ceil() as i64).min(i64::from(height));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/svg.rs"]
mod tests;
