use super::*;

struct Buf {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Buf {
    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    fn set(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = ((y * self.width + x) * 4) as usize;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    fn fill_rect(&mut self, x0: u32, y0: u32, w: u32, h: u32, rgb: [u8; 3]) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                self.set(x, y, rgb);
            }
        }
    }

    fn view(&self) -> PixelView<'_> {
        PixelView::new(self.width, self.height, &self.data).unwrap()
    }
}

const WHITE: [u8; 3] = [255, 255, 255];

#[test]
fn view_rejects_mismatched_length() {
    assert!(PixelView::new(2, 2, &[0u8; 15]).is_none());
    assert!(PixelView::new(2, 2, &[0u8; 16]).is_some());
}

#[test]
fn identical_buffers_score_zero() {
    let mut a = Buf::solid(16, 12, WHITE);
    a.fill_rect(3, 3, 6, 6, [10, 200, 30]);
    assert_eq!(dissimilarity(a.view(), a.view()), 0);
}

#[test]
fn tiny_overlap_scores_zero() {
    let a = Buf::solid(2, 50, WHITE);
    let b = Buf::solid(50, 50, [0, 0, 0]);
    assert_eq!(dissimilarity(a.view(), b.view()), 0);

    let c = Buf::solid(50, 2, WHITE);
    assert_eq!(dissimilarity(c.view(), b.view()), 0);
}

#[test]
fn isolated_pixel_is_filtered() {
    let a = Buf::solid(10, 10, WHITE);
    let mut b = Buf::solid(10, 10, WHITE);
    b.set(5, 5, [0, 0, 0]);
    assert_eq!(dissimilarity(a.view(), b.view()), 0);
}

#[test]
fn sub_threshold_noise_is_filtered() {
    let a = Buf::solid(10, 10, WHITE);
    let b = Buf::solid(10, 10, [253, 253, 253]);
    assert_eq!(dissimilarity(a.view(), b.view()), 0);
}

#[test]
fn divergent_block_counts_interior_windows() {
    // A 5x5 block of error 50 starting at (2,2): pixels whose trailing 3x3 window lies inside
    // the block are x, y in 4..=6, i.e. 3x3 of them.
    let a = Buf::solid(12, 12, WHITE);
    let mut b = Buf::solid(12, 12, WHITE);
    b.fill_rect(2, 2, 5, 5, [205, 205, 205]);
    assert_eq!(dissimilarity(a.view(), b.view()), 9 * 50);
}

#[test]
fn exact_three_by_three_block_counts_its_corner() {
    let a = Buf::solid(8, 8, WHITE);
    let mut b = Buf::solid(8, 8, WHITE);
    b.fill_rect(1, 1, 3, 3, [155, 155, 155]);
    assert_eq!(dissimilarity(a.view(), b.view()), 100);
}

#[test]
fn full_frame_divergence_skips_first_two_rows_and_columns() {
    let a = Buf::solid(7, 6, WHITE);
    let b = Buf::solid(7, 6, [245, 250, 255]);
    // Error per pixel is max(10, 5, 0) = 10.
    assert_eq!(dissimilarity(a.view(), b.view()), (7 - 2) * (6 - 2) * 10);
}

#[test]
fn score_is_symmetric_and_ignores_alpha() {
    let mut a = Buf::solid(20, 20, WHITE);
    a.fill_rect(4, 4, 9, 7, [0, 128, 255]);
    let mut b = Buf::solid(20, 20, WHITE);
    b.fill_rect(6, 5, 8, 8, [60, 0, 30]);
    for px in b.data.chunks_exact_mut(4) {
        px[3] = 7;
    }
    let ab = dissimilarity(a.view(), b.view());
    let ba = dissimilarity(b.view(), a.view());
    assert!(ab > 0);
    assert_eq!(ab, ba);
}

#[test]
fn compares_only_the_overlap() {
    let a = Buf::solid(6, 6, WHITE);
    let mut b = Buf::solid(40, 40, WHITE);
    // Divergence entirely outside the 6x6 overlap.
    b.fill_rect(10, 10, 20, 20, [0, 0, 0]);
    assert_eq!(dissimilarity(a.view(), b.view()), 0);
}
