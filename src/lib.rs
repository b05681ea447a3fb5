//! Attention-map visualization: render where a model attends for query
//! points, as heatmaps blended onto the target image.
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, trace};

pub mod attention;
pub mod codec;
pub mod colormap;
pub mod compose;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod points;
pub mod render;

pub use attention::{AttentionVolume, SliceStats};
pub use codec::{encode_png, FileCodec, ImageCodec};
pub use colormap::{ColorMapper, Jet};
pub use error::{AttvisError, Result};
pub use geometry::{get_boundary, Boundary, QueryPoint};
pub use points::parse_points;
pub use render::{AttentionOverlayRenderer, OverlayRender, RenderParams};

/// Everything one run needs: input locations, query points and parameters.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub model_name: String,
    pub source: Option<PathBuf>,
    pub target: PathBuf,
    pub attention: PathBuf,
    pub points: Vec<QueryPoint>,
    pub save_dir: PathBuf,
    pub params: RenderParams,
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Render every query point and persist the results through `codec`.
///
/// For each point the source highlight (if a source is given) is written
/// first, then the target overlay. Returns the written paths in order. The
/// first failing point aborts the run; files already written are kept.
pub fn render_attention_overlays<C: ImageCodec + ?Sized>(
    config: &RunConfig,
    codec: &C,
) -> Result<Vec<PathBuf>> {
    let params = config.params.validated()?;
    if config.points.is_empty() {
        return Err(AttvisError::InvalidPoints {
            input: String::new(),
            reason: "no points given".to_string(),
        });
    }

    let source = match &config.source {
        Some(path) => Some(codec::scale_image(&codec.decode(path)?, params.scale)?),
        None => None,
    };
    let target = codec::scale_image(&codec.decode(&config.target)?, params.scale)?;
    let attention = AttentionVolume::load(&config.attention)?;
    trace!(
        "target {:?}, query grid {:?}, key grid {:?}",
        target.dimensions(),
        attention.query_grid(),
        attention.key_grid()
    );

    fs::create_dir_all(&config.save_dir).map_err(|source| AttvisError::Io {
        path: config.save_dir.clone(),
        source,
    })?;

    let self_attention = config.source.as_deref() == Some(config.target.as_path());
    let mut renderer = AttentionOverlayRenderer::new(&attention, &target, Jet::new(), params);
    if let Some(source) = source.as_ref() {
        renderer = renderer.with_source(source, self_attention);
    }

    let target_stem = file_stem(&config.target);
    let source_stem = config.source.as_deref().map(file_stem);
    let mut written = Vec::new();
    let mut save = |image: &image::RgbImage, name: String| -> Result<()> {
        let path = config.save_dir.join(name);
        codec.encode(image, &path)?;
        info!("Saved '{}'", path.display());
        written.push(path);
        Ok(())
    };

    for &point in &config.points {
        // Nothing is written for a point outside the attention grid.
        renderer.query_slice(point)?;

        if let (Some(highlighted), Some(stem)) =
            (renderer.highlight_source(point), source_stem.as_deref())
        {
            save(&highlighted, render::highlight_file_name(stem, point))?;
        }

        let rendered = renderer.render_overlay(point)?;

        if params.dump_attention {
            let (abs_mean, std) = attention::abs_mean_and_std(&rendered.coarse);
            info!(
                "[{}, {}] attention {:?}. mean/std: {:.5}, {:.5}",
                point.x,
                point.y,
                rendered.coarse.shape(),
                abs_mean,
                std
            );
            let dump = Jet::new().apply(&attention::stretch_to_u8(&rendered.coarse));
            save(
                &dump,
                render::attention_dump_file_name(&target_stem, point, &config.model_name),
            )?;
        }

        save(
            &rendered.image,
            render::overlay_file_name(&target_stem, point, &config.model_name),
        )?;
    }

    Ok(written)
}
