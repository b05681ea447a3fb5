//! Attention volume loading and the per-point slice pipeline: masking,
//! median-centering, resizing and 8-bit normalization.
use std::path::Path;

use image::{GrayImage, Luma};
use ndarray::{s, Array2, ArrayD, ArrayView2, Axis, Ix5};
use ndarray_npy::{read_npy, ReadNpyError};

use crate::error::{AttvisError, Result};
use crate::geometry::{get_boundary, Boundary};

// --- attention volume ---

/// Coarse attention with the batch axis dropped:
/// `[query_rows, query_cols, key_rows, key_cols]`.
#[derive(Debug, Clone)]
pub struct AttentionVolume {
    data: ndarray::Array4<f32>,
}

impl AttentionVolume {
    /// Accept a `[1, qh, qw, kh, kw]` array.
    pub fn from_array(array: ArrayD<f32>) -> Result<Self> {
        let shape = array.shape().to_vec();
        let five = array
            .into_dimensionality::<Ix5>()
            .map_err(|_| AttvisError::TensorShape(shape.clone()))?;
        if shape[0] != 1 {
            return Err(AttvisError::BatchSize(shape[0]));
        }
        Ok(Self {
            data: five.index_axis_move(Axis(0), 0),
        })
    }

    /// Load an `.npy` file holding `f32` or `f64` values.
    pub fn load(path: &Path) -> Result<Self> {
        let tensor_err = |e: ReadNpyError| AttvisError::Tensor {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let array: ArrayD<f32> = match read_npy(path) {
            Ok(array) => array,
            Err(ReadNpyError::WrongDescriptor(_)) => {
                let wide: ArrayD<f64> = read_npy(path).map_err(tensor_err)?;
                wide.mapv(|v| v as f32)
            }
            Err(e) => return Err(tensor_err(e)),
        };
        Self::from_array(array)
    }

    pub fn query_grid(&self) -> (usize, usize) {
        let d = self.data.dim();
        (d.0, d.1)
    }

    pub fn key_grid(&self) -> (usize, usize) {
        let d = self.data.dim();
        (d.2, d.3)
    }

    /// Attention over the key grid for one query cell.
    pub fn slice(&self, row: i64, col: i64) -> Option<ArrayView2<'_, f32>> {
        let (rows, cols) = self.query_grid();
        if row < 0 || col < 0 || row as usize >= rows || col as usize >= cols {
            return None;
        }
        Some(self.data.slice(s![row as usize, col as usize, .., ..]))
    }
}

// --- per-point slice pipeline ---

/// Per-slice numbers reported in the logs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceStats {
    pub median: f32,
    pub positive: usize,
    pub negative: usize,
}

/// Median with the two middle values averaged for even counts. NaN when empty.
pub fn median(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return f32::NAN;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

/// Zero everything outside `boundary`; the box is clipped to the slice extent.
pub fn mask_outside(slice: ArrayView2<'_, f32>, boundary: &Boundary) -> Array2<f32> {
    Array2::from_shape_fn(slice.dim(), |(r, c)| {
        if boundary.contains(r as i64, c as i64) {
            slice[(r, c)]
        } else {
            0.0
        }
    })
}

/// Mask the slice around `(row, col)` when `radius > 0` and compute its stats.
///
/// `coarse_rows`/`coarse_cols` are the coarse extents of the working target
/// image. The median covers only in-box cells when masking, the whole slice
/// otherwise.
pub fn prepare_slice(
    slice: ArrayView2<'_, f32>,
    row: i64,
    col: i64,
    coarse_rows: i64,
    coarse_cols: i64,
    radius: i64,
) -> (Array2<f32>, SliceStats) {
    let (masked, median) = if radius > 0 {
        let boundary = get_boundary(row, col, coarse_rows, coarse_cols, radius);
        let masked = mask_outside(slice, &boundary);
        let mut inside: Vec<f32> = slice
            .indexed_iter()
            .filter(|((r, c), _)| boundary.contains(*r as i64, *c as i64))
            .map(|(_, v)| *v)
            .collect();
        (masked, median(&mut inside))
    } else {
        let mut all: Vec<f32> = slice.iter().copied().collect();
        (slice.to_owned(), median(&mut all))
    };

    let positive = masked.iter().filter(|v| **v > 0.0).count();
    let negative = masked.iter().filter(|v| **v < 0.0).count();
    (
        masked,
        SliceStats {
            median,
            positive,
            negative,
        },
    )
}

// Source index pair and blend weight for each destination index, using
// half-pixel centres and edge clamping.
fn bilinear_taps(dst: usize, src: usize) -> Vec<(usize, usize, f32)> {
    let ratio = src as f64 / dst as f64;
    let last = src as i64 - 1;
    (0..dst)
        .map(|d| {
            let pos = (d as f64 + 0.5) * ratio - 0.5;
            let mut i0 = pos.floor() as i64;
            let mut t = pos - i0 as f64;
            if i0 < 0 {
                i0 = 0;
                t = 0.0;
            }
            if i0 >= last {
                i0 = last;
                t = 0.0;
            }
            let i1 = (i0 + 1).min(last);
            (i0 as usize, i1 as usize, t as f32)
        })
        .collect()
}

/// Bilinear resize of a 2D map to `(height, width)`.
pub fn resize_bilinear(src: ArrayView2<'_, f32>, height: usize, width: usize) -> Array2<f32> {
    let (src_h, src_w) = src.dim();
    if src_h == 0 || src_w == 0 {
        return Array2::zeros((height, width));
    }
    let rows = bilinear_taps(height, src_h);
    let cols = bilinear_taps(width, src_w);
    Array2::from_shape_fn((height, width), |(y, x)| {
        let (y0, y1, ty) = rows[y];
        let (x0, x1, tx) = cols[x];
        let top = src[(y0, x0)] * (1.0 - tx) + src[(y0, x1)] * tx;
        let bottom = src[(y1, x0)] * (1.0 - tx) + src[(y1, x1)] * tx;
        top * (1.0 - ty) + bottom * ty
    })
}

/// Subtract `median`, clamp at zero and scale so the maximum maps to 255.
///
/// Returns `None` when nothing lies above the median.
pub fn normalize_above_median(map: &Array2<f32>, median: f32) -> Option<GrayImage> {
    let centred = map.mapv(|v| (v - median).max(0.0));
    let max = centred.iter().fold(0.0f32, |acc, v| acc.max(*v));
    if max <= 0.0 || !max.is_finite() || !median.is_finite() {
        return None;
    }
    let (h, w) = centred.dim();
    Some(GrayImage::from_fn(w as u32, h as u32, |x, y| {
        let v = 255.0 * centred[(y as usize, x as usize)] / max;
        Luma([v as u8])
    }))
}

// --- diagnostics ---

/// Min-max stretch to 0..=255, as an autoscaling matrix plot would show it.
pub fn stretch_to_u8(map: &Array2<f32>) -> GrayImage {
    let (lo, hi) = map
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let span = hi - lo;
    let (h, w) = map.dim();
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        let v = map[(y as usize, x as usize)];
        if span > 0.0 && span.is_finite() {
            Luma([(255.0 * (v - lo) / span) as u8])
        } else {
            Luma([0])
        }
    })
}

/// Mean absolute value and population standard deviation.
pub fn abs_mean_and_std(map: &Array2<f32>) -> (f32, f32) {
    if map.is_empty() {
        return (0.0, 0.0);
    }
    let n = map.len() as f32;
    let abs_mean = map.iter().map(|v| v.abs()).sum::<f32>() / n;
    let mean = map.sum() / n;
    let var = map.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
    (abs_mean, var.sqrt())
}
