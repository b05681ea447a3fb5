use anyhow::{Context, Result};
use attvis::{logging, parse_points, render_attention_overlays, FileCodec, RenderParams, RunConfig};
use clap::{ArgAction, Parser};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Render attention heatmap overlays for query points",
    allow_negative_numbers = true
)]
struct Args {
    /// Model name used in output filenames
    #[arg(long = "model")]
    model_name: String,

    /// Source image (the frame holding the query points)
    #[arg(long = "img1")]
    img1_path: Option<PathBuf>,

    /// Target image the heatmap is drawn on
    #[arg(long = "img2")]
    img2_path: PathBuf,

    /// Query points as x1,y1.x2,y2...
    #[arg(long)]
    points: String,

    /// Attention tensor (.npy) with shape [1, H/8, W/8, H/8, W/8]
    #[arg(long = "att")]
    attention5d_path: PathBuf,

    /// Output directory, created if absent
    #[arg(long, default_value = "attvis")]
    savedir: PathBuf,

    /// Uniform scale applied to both images
    #[arg(long = "scale", default_value_t = 1.0)]
    img_scale: f64,

    /// Attention mask radius in 1/8-resolution cells (<= 0 disables masking)
    #[arg(long, default_value_t = 16)]
    radius: i64,

    /// Highlight rectangle radius in pixels
    #[arg(long = "box_radius", default_value_t = 8)]
    box_radius: i64,

    /// Blend weight of the highlight rectangle
    #[arg(long, default_value_t = 1.0)]
    alpha: f64,

    /// Mark the query location on img2 when it differs from img1
    #[arg(long = "proj_img2")]
    proj_img2: bool,

    /// Also save the coarse attention slice of each point
    #[arg(long = "dump_attention")]
    dump_attention: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_logger(args.verbose, args.quiet);

    let points = parse_points(&args.points).context("Failed to parse --points")?;

    let config = RunConfig {
        model_name: args.model_name,
        source: args.img1_path,
        target: args.img2_path,
        attention: args.attention5d_path,
        points,
        save_dir: args.savedir,
        params: RenderParams {
            radius: args.radius,
            box_radius: args.box_radius,
            scale: args.img_scale,
            alpha: args.alpha,
            proj_target: args.proj_img2,
            dump_attention: args.dump_attention,
        },
    };

    let written = render_attention_overlays(&config, &FileCodec).with_context(|| {
        format!(
            "Failed to render attention overlays for {}",
            config.target.display()
        )
    })?;

    info!("Wrote {} file(s) to {}", written.len(), config.save_dir.display());
    Ok(())
}
