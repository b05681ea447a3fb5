#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use attvis::{AttvisError, ImageCodec};
use image::{Rgb, RgbImage};
use ndarray::{ArrayD, IxDyn};

/// `[1, qh, qw, kh, kw]` attention that decays with distance from the query cell.
pub fn peaked_attention(qh: usize, qw: usize, kh: usize, kw: usize) -> ArrayD<f32> {
    ArrayD::from_shape_fn(IxDyn(&[1, qh, qw, kh, kw]), |d| {
        let dr = d[1] as f32 - d[3] as f32;
        let dc = d[2] as f32 - d[4] as f32;
        1.0 / (1.0 + dr * dr + dc * dc)
    })
}

pub fn write_attention(dir: &Path, name: &str, array: &ArrayD<f32>) -> PathBuf {
    let path = dir.join(name);
    ndarray_npy::write_npy(&path, array).expect("write attention npy");
    path
}

pub fn uniform_image(width: u32, height: u32, value: u8) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([value, value, value]))
}

/// Codec serving inputs from memory and recording every encoded image.
#[derive(Default)]
pub struct MemoryCodec {
    pub inputs: HashMap<PathBuf, RgbImage>,
    pub outputs: RefCell<Vec<(PathBuf, RgbImage)>>,
}

impl MemoryCodec {
    pub fn with_input(mut self, path: impl Into<PathBuf>, image: RgbImage) -> Self {
        self.inputs.insert(path.into(), image);
        self
    }

    pub fn output(&self, name: &str) -> Option<RgbImage> {
        self.outputs
            .borrow()
            .iter()
            .find(|(p, _)| p.file_name().and_then(|n| n.to_str()) == Some(name))
            .map(|(_, img)| img.clone())
    }

    pub fn output_names(&self) -> Vec<String> {
        self.outputs
            .borrow()
            .iter()
            .filter_map(|(p, _)| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect()
    }
}

impl ImageCodec for MemoryCodec {
    fn decode(&self, path: &Path) -> attvis::Result<RgbImage> {
        self.inputs.get(path).cloned().ok_or_else(|| AttvisError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such test image"),
        })
    }

    fn encode(&self, image: &RgbImage, path: &Path) -> attvis::Result<()> {
        self.outputs
            .borrow_mut()
            .push((path.to_path_buf(), image.clone()));
        Ok(())
    }
}
