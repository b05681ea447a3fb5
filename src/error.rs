use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttvisError {
    #[error("image error for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read attention tensor {path}: {reason}")]
    Tensor { path: PathBuf, reason: String },

    #[error("attention tensor must be 5-dimensional, got shape {0:?}")]
    TensorShape(Vec<usize>),

    #[error("attention tensor batch dimension must be 1, got {0}")]
    BatchSize(usize),

    #[error("invalid points string {input:?}: {reason}")]
    InvalidPoints { input: String, reason: String },

    #[error(
        "point ({x},{y}) maps to coarse cell ({row},{col}) outside the {rows}x{cols} attention grid"
    )]
    PointOutOfRange {
        x: i64,
        y: i64,
        row: i64,
        col: i64,
        rows: usize,
        cols: usize,
    },

    #[error("attention at point ({x},{y}) has no values above its median; cannot normalize")]
    DegenerateAttention { x: i64, y: i64 },

    #[error("scale must be a positive finite number, got {0}")]
    InvalidScale(f64),

    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AttvisError>;
