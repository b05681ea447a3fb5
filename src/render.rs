//! Per-point attention overlay rendering.
use image::{Rgb, RgbImage};
use log::debug;
use ndarray::{Array2, ArrayView2};

use crate::attention::{
    normalize_above_median, prepare_slice, resize_bilinear, AttentionVolume, SliceStats,
};
use crate::colormap::ColorMapper;
use crate::compose::{blend_heatmap, highlight, BoxColors};
use crate::error::{AttvisError, Result};
use crate::geometry::{get_boundary, Boundary, QueryPoint, COARSE_STRIDE};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    /// Attention mask radius in coarse cells; `<= 0` disables masking.
    pub radius: i64,
    /// Highlight rectangle radius in working-image pixels.
    pub box_radius: i64,
    /// Uniform scale applied to both images before rendering.
    pub scale: f64,
    /// Blend weight of the highlight rectangle.
    pub alpha: f64,
    /// Mark the query location on a target that is a different frame.
    pub proj_target: bool,
    /// Also save the coarse attention slice of every point.
    pub dump_attention: bool,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            radius: 16,
            box_radius: 8,
            scale: 1.0,
            alpha: 1.0,
            proj_target: false,
            dump_attention: false,
        }
    }
}

impl RenderParams {
    /// Reject unusable scales. `alpha` is taken as given; blending saturates.
    pub fn validated(self) -> Result<Self> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(AttvisError::InvalidScale(self.scale));
        }
        Ok(self)
    }
}

/// Result of rendering one query point onto the target image.
#[derive(Debug, Clone)]
pub struct OverlayRender {
    pub image: RgbImage,
    /// Coarse attention slice after masking.
    pub coarse: Array2<f32>,
    pub stats: SliceStats,
}

/// Renders attention overlays for query points against fixed inputs.
///
/// The attention volume and both images are borrowed read-only, so one
/// renderer serves every point of a run.
pub struct AttentionOverlayRenderer<'a, M> {
    attention: &'a AttentionVolume,
    target: &'a RgbImage,
    source: Option<&'a RgbImage>,
    self_attention: bool,
    params: RenderParams,
    colormap: M,
}

impl<'a, M: ColorMapper> AttentionOverlayRenderer<'a, M> {
    /// `target` must already be scaled by `params.scale`.
    pub fn new(
        attention: &'a AttentionVolume,
        target: &'a RgbImage,
        colormap: M,
        params: RenderParams,
    ) -> Self {
        Self {
            attention,
            target,
            source: None,
            self_attention: false,
            params,
            colormap,
        }
    }

    /// Attach the (scaled) source image. `self_attention` is set when source
    /// and target are the same file.
    pub fn with_source(mut self, source: &'a RgbImage, self_attention: bool) -> Self {
        self.source = Some(source);
        self.self_attention = self_attention;
        self
    }

    /// Rectangle color for the target overlay, if any.
    pub fn target_marker(&self) -> Option<Rgb<u8>> {
        if self.self_attention {
            Some(BoxColors::SELF_ATTENTION)
        } else if self.params.proj_target {
            Some(BoxColors::PROJECTED)
        } else {
            None
        }
    }

    fn query_box(&self, point: QueryPoint) -> Boundary {
        let (x, y) = point.scaled(self.params.scale);
        get_boundary(
            y,
            x,
            self.target.height() as i64,
            self.target.width() as i64,
            self.params.box_radius,
        )
    }

    /// Source image with the query location outlined, when a source is set.
    pub fn highlight_source(&self, point: QueryPoint) -> Option<RgbImage> {
        let source = self.source?;
        let boundary = self.query_box(point);
        Some(highlight(
            source,
            &boundary,
            Some(BoxColors::SOURCE),
            self.params.alpha,
        ))
    }

    /// Attention slice for the coarse cell holding `point`.
    pub fn query_slice(&self, point: QueryPoint) -> Result<ArrayView2<'a, f32>> {
        let (row, col) = point.coarse_cell(self.params.scale);
        self.attention.slice(row, col).ok_or_else(|| {
            let (rows, cols) = self.attention.query_grid();
            AttvisError::PointOutOfRange {
                x: point.x,
                y: point.y,
                row,
                col,
                rows,
                cols,
            }
        })
    }

    /// Heatmap of the attention from `point`, blended onto the target.
    pub fn render_overlay(&self, point: QueryPoint) -> Result<OverlayRender> {
        let height = self.target.height() as i64;
        let width = self.target.width() as i64;
        let (sx, sy) = point.scaled(self.params.scale);
        let (row, col) = point.coarse_cell(self.params.scale);
        debug!(
            "{},{} => {},{} => {},{}",
            point.x, point.y, sx, sy, col, row
        );

        let slice = self.query_slice(point)?;

        let (coarse, stats) = prepare_slice(
            slice,
            row,
            col,
            height / COARSE_STRIDE,
            width / COARSE_STRIDE,
            self.params.radius,
        );
        debug!(
            "[{}, {}]: median {}, {} > 0, {} < 0",
            point.x, point.y, stats.median, stats.positive, stats.negative
        );

        let full = resize_bilinear(coarse.view(), height as usize, width as usize);
        let normalized = normalize_above_median(&full, stats.median).ok_or(
            AttvisError::DegenerateAttention {
                x: point.x,
                y: point.y,
            },
        )?;
        let heatmap = self.colormap.apply(&normalized);
        let overlay = blend_heatmap(self.target, &heatmap);

        let boundary = self.query_box(point);
        let image = highlight(&overlay, &boundary, self.target_marker(), self.params.alpha);
        Ok(OverlayRender {
            image,
            coarse,
            stats,
        })
    }
}

pub fn overlay_file_name(target_stem: &str, point: QueryPoint, model_name: &str) -> String {
    format!("{target_stem}-{},{}-{model_name}.png", point.x, point.y)
}

pub fn highlight_file_name(source_stem: &str, point: QueryPoint) -> String {
    format!("{source_stem}-{},{}-highlight.png", point.x, point.y)
}

pub fn attention_dump_file_name(target_stem: &str, point: QueryPoint, model_name: &str) -> String {
    format!("{target_stem}-{},{}-{model_name}-attn.png", point.x, point.y)
}
