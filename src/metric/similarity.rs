//! Pixel dissimilarity between two renderings of the same scene.
//!
//! The score sums per-pixel channel errors, but only for pixels that sit inside a region where
//! every pixel diverges. Isolated differences (anti-aliasing noise along edges) score zero.

/// Rows kept in the sliding error window, and the smallest overlap that is compared at all.
pub const WINDOW_ROWS: usize = 3;

/// Smallest per-pixel error that counts as divergent.
pub const ERROR_THRESHOLD: u32 = 3;

/// Borrowed view over tightly packed RGBA8 rows.
#[derive(Clone, Copy, Debug)]
pub struct PixelView<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes, row-major.
    pub data: &'a [u8],
}

impl<'a> PixelView<'a> {
    /// Wrap `data`, checking that it holds exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, data: &'a [u8]) -> Option<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (data.len() == len).then_some(Self {
            width,
            height,
            data,
        })
    }

    fn row(&self, y: usize) -> &'a [u8] {
        let stride = self.width as usize * 4;
        &self.data[y * stride..(y + 1) * stride]
    }
}

/// Score the visible divergence between `a` and `b` over their overlapping area.
///
/// Returns 0 when the overlap is narrower or shorter than [`WINDOW_ROWS`]. The result is
/// symmetric in its arguments and zero for identical inputs.
pub fn dissimilarity(a: PixelView<'_>, b: PixelView<'_>) -> u64 {
    let width = a.width.min(b.width) as usize;
    let height = a.height.min(b.height) as usize;
    if width < WINDOW_ROWS || height < WINDOW_ROWS {
        return 0;
    }

    // Ring of the last three rows of per-pixel error; row `y` lives at slot `y % 3`.
    let mut ring = vec![0u32; width * WINDOW_ROWS];
    let mut total = 0u64;

    for y in 0..height {
        let row_a = a.row(y);
        let row_b = b.row(y);
        let slot = (y % WINDOW_ROWS) * width;

        for x in 0..width {
            let pa = &row_a[x * 4..x * 4 + 3];
            let pb = &row_b[x * 4..x * 4 + 3];
            let error = pa
                .iter()
                .zip(pb)
                .map(|(&ca, &cb)| u32::from(ca.abs_diff(cb)))
                .max()
                .unwrap_or(0);
            ring[slot + x] = error;

            if error < ERROR_THRESHOLD || x < 2 {
                continue;
            }
            if !window_diverges(&ring, width, x) {
                continue;
            }
            total += u64::from(error);
        }
    }

    total
}

/// Whether every error in columns `x-2..=x` of all three ring rows reaches the threshold.
fn window_diverges(ring: &[u32], width: usize, x: usize) -> bool {
    (0..WINDOW_ROWS).all(|r| {
        let start = r * width + x - 2;
        ring[start..=start + 2]
            .iter()
            .all(|&e| e >= ERROR_THRESHOLD)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/metric/similarity.rs"]
mod tests;
