//! Compositing of heatmaps and highlight rectangles onto RGB images.
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::geometry::Boundary;

/// Rectangle colors for the three highlight cases.
pub struct BoxColors;
impl BoxColors {
    // Query location on the target when it is also the source
    pub const SELF_ATTENTION: Rgb<u8> = Rgb([255, 0, 0]);
    // Query location projected onto a different target frame
    pub const PROJECTED: Rgb<u8> = Rgb([0, 255, 0]);
    // Query location on the source image
    pub const SOURCE: Rgb<u8> = Rgb([0, 0, 255]);
}

const TARGET_WEIGHT: f64 = 0.6;
const HEATMAP_WEIGHT: f64 = 0.3;

/// `target*0.6 + heatmap*0.3`, truncated to u8. The weights do not sum to one,
/// which dims the result.
pub fn blend_heatmap(target: &RgbImage, heatmap: &RgbImage) -> RgbImage {
    debug_assert_eq!(target.dimensions(), heatmap.dimensions());
    let (w, h) = target.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let t = target.get_pixel(x, y).0;
        let m = heatmap.get_pixel(x, y).0;
        Rgb(std::array::from_fn(|c| {
            (t[c] as f64 * TARGET_WEIGHT + m[c] as f64 * HEATMAP_WEIGHT) as u8
        }))
    })
}

/// `round(a*(1-alpha) + b*alpha)`, saturated to u8.
pub fn add_weighted(a: &RgbImage, b: &RgbImage, alpha: f64) -> RgbImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let (w, h) = a.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let pa = a.get_pixel(x, y).0;
        let pb = b.get_pixel(x, y).0;
        Rgb(std::array::from_fn(|c| {
            (pa[c] as f64 * (1.0 - alpha) + pb[c] as f64 * alpha)
                .round()
                .clamp(0.0, 255.0) as u8
        }))
    })
}

/// One-pixel outline with corners `(left, top)` and `(right, bottom)` inclusive.
/// Parts falling outside the image are clipped.
pub fn draw_box(image: &mut RgbImage, boundary: &Boundary, color: Rgb<u8>) {
    let width = (boundary.right - boundary.left + 1).max(1) as u32;
    let height = (boundary.bottom - boundary.top + 1).max(1) as u32;
    let rect = Rect::at(boundary.left as i32, boundary.top as i32).of_size(width, height);
    draw_hollow_rect_mut(image, rect, color);
}

/// Draw an optional box on a copy of `image` and fade it in with `alpha`.
pub fn highlight(
    image: &RgbImage,
    boundary: &Boundary,
    color: Option<Rgb<u8>>,
    alpha: f64,
) -> RgbImage {
    let mut marked = image.clone();
    if let Some(color) = color {
        draw_box(&mut marked, boundary, color);
    }
    add_weighted(image, &marked, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::get_boundary;

    #[test]
    fn heatmap_blend_truncates() {
        let target = RgbImage::from_pixel(2, 2, Rgb([255, 100, 1]));
        let heat = RgbImage::from_pixel(2, 2, Rgb([255, 0, 255]));
        let out = blend_heatmap(&target, &heat);
        // 153 + 76.5, 60 + 0, 0.6 + 76.5
        assert_eq!(out.get_pixel(1, 1).0, [229, 60, 77]);
    }

    #[test]
    fn add_weighted_extremes() {
        let a = RgbImage::from_pixel(1, 1, Rgb([0, 100, 200]));
        let b = RgbImage::from_pixel(1, 1, Rgb([255, 50, 0]));
        assert_eq!(add_weighted(&a, &b, 1.0), b);
        assert_eq!(add_weighted(&a, &b, 0.0), a);
        assert_eq!(add_weighted(&a, &b, 0.5).get_pixel(0, 0).0, [128, 75, 100]);
        // Weights outside [0, 1] extrapolate and saturate.
        assert_eq!(add_weighted(&a, &b, -1.0).get_pixel(0, 0).0, [0, 150, 255]);
        assert_eq!(add_weighted(&a, &b, 1.5).get_pixel(0, 0).0, [255, 25, 0]);
    }

    #[test]
    fn box_outline_is_inclusive() {
        let mut img = RgbImage::new(20, 20);
        let b = get_boundary(10, 10, 20, 20, 2);
        draw_box(&mut img, &b, BoxColors::PROJECTED);
        for (x, y) in [(8, 8), (13, 8), (8, 13), (13, 13), (10, 8), (8, 10)] {
            assert_eq!(*img.get_pixel(x, y), BoxColors::PROJECTED, "({x},{y})");
        }
        assert_eq!(*img.get_pixel(10, 10), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(14, 14), Rgb([0, 0, 0]));
    }

    #[test]
    fn box_near_edge_is_clipped() {
        let mut img = RgbImage::new(10, 10);
        let b = get_boundary(9, 9, 10, 10, 3);
        draw_box(&mut img, &b, BoxColors::SOURCE);
        assert_eq!(*img.get_pixel(6, 6), BoxColors::SOURCE);
        assert_eq!(*img.get_pixel(9, 6), BoxColors::SOURCE);
    }

    #[test]
    fn highlight_without_color_is_identity() {
        let img = RgbImage::from_pixel(6, 6, Rgb([40, 50, 60]));
        let b = get_boundary(3, 3, 6, 6, 1);
        assert_eq!(highlight(&img, &b, None, 1.0), img);
        let faded = highlight(&img, &b, Some(BoxColors::SELF_ATTENTION), 0.5);
        assert_eq!(faded.get_pixel(2, 2).0, [148, 25, 30]);
        assert_eq!(faded.get_pixel(3, 3).0, [40, 50, 60]);
    }
}
