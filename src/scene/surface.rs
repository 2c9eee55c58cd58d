use resvg::tiny_skia;

use crate::{
    foundation::error::{HarnessError, HarnessResult},
    metric::similarity::PixelView,
};

/// A premultiplied RGBA8 raster target.
///
/// Allocation is fallible and bounded, so oversized scenes surface as
/// [`HarnessError::Allocation`] instead of aborting the process.
#[derive(Clone, Debug)]
pub struct Surface {
    pixmap: tiny_skia::Pixmap,
}

impl Surface {
    /// Allocate a transparent `width x height` surface of at most `max_pixels` pixels.
    pub fn try_alloc(width: u32, height: u32, max_pixels: u64) -> HarnessResult<Self> {
        let pixels = u64::from(width) * u64::from(height);
        if pixels == 0 {
            return Err(HarnessError::allocation(format!(
                "surface has no pixels ({width}x{height})"
            )));
        }
        if pixels > max_pixels {
            return Err(HarnessError::allocation(format!(
                "surface {width}x{height} exceeds budget of {max_pixels} pixels"
            )));
        }
        let len = usize::try_from(pixels)
            .ok()
            .and_then(|px| px.checked_mul(4))
            .ok_or_else(|| {
                HarnessError::allocation(format!("surface {width}x{height} overflows usize"))
            })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            HarnessError::allocation(format!("surface {width}x{height}: {e}"))
        })?;
        data.resize(len, 0);

        let size = tiny_skia::IntSize::from_wh(width, height).ok_or_else(|| {
            HarnessError::allocation(format!("invalid surface size {width}x{height}"))
        })?;
        let pixmap = tiny_skia::Pixmap::from_vec(data, size).ok_or_else(|| {
            HarnessError::allocation(format!("surface {width}x{height} rejected by rasterizer"))
        })?;
        Ok(Self { pixmap })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Fill every pixel with a straight-alpha RGBA8 color.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        self.pixmap.fill(tiny_skia::Color::from_rgba8(
            rgba[0], rgba[1], rgba[2], rgba[3],
        ));
    }

    /// Fill an axis-aligned rectangle with a straight-alpha RGBA8 color. Out-of-bounds parts are
    /// clipped; degenerate rectangles draw nothing.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, rgba: [u8; 4]) {
        let Some(rect) = tiny_skia::Rect::from_xywh(x, y, w, h) else {
            return;
        };
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
        paint.anti_alias = false;
        self.pixmap
            .fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// View for the metric engine.
    pub fn view(&self) -> PixelView<'_> {
        PixelView {
            width: self.width(),
            height: self.height(),
            data: self.pixmap.data(),
        }
    }

    /// Straight-alpha RGBA8 copy, as image encoders expect.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    pub(crate) fn pixmap(&self) -> &tiny_skia::Pixmap {
        &self.pixmap
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut tiny_skia::Pixmap {
        &mut self.pixmap
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/surface.rs"]
mod tests;
