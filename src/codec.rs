//! Decoding, encoding and scaling of RGB image buffers.
use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbImage};

use crate::error::{AttvisError, Result};

/// Storage for input and output images.
pub trait ImageCodec {
    fn decode(&self, path: &Path) -> Result<RgbImage>;
    fn encode(&self, image: &RgbImage, path: &Path) -> Result<()>;
}

/// Reads and writes images on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileCodec;

impl ImageCodec for FileCodec {
    fn decode(&self, path: &Path) -> Result<RgbImage> {
        Ok(image::open(path)
            .map_err(|source| AttvisError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8())
    }

    fn encode(&self, image: &RgbImage, path: &Path) -> Result<()> {
        let png = encode_png(image).map_err(|source| AttvisError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, png).map_err(|source| AttvisError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Encode an RGB buffer as PNG bytes.
pub fn encode_png(image: &RgbImage) -> std::result::Result<Vec<u8>, image::ImageError> {
    let mut out: Vec<u8> = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}

/// Resize by a uniform factor; the output is `round(w*scale) x round(h*scale)`.
pub fn scale_image(image: &RgbImage, scale: f64) -> Result<RgbImage> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(AttvisError::InvalidScale(scale));
    }
    if scale == 1.0 {
        return Ok(image.clone());
    }
    let (w, h) = image.dimensions();
    let nw = ((w as f64 * scale).round() as u32).max(1);
    let nh = ((h as f64 * scale).round() as u32).max(1);
    Ok(imageops::resize(image, nw, nh, FilterType::Triangle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn png_bytes_decode_back() {
        let img = RgbImage::from_fn(7, 4, |x, y| Rgb([x as u8 * 30, y as u8 * 60, 9]));
        let png = encode_png(&img).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let back = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(back, img);
    }

    #[test]
    fn scaling_rounds_dimensions() {
        let img = RgbImage::new(101, 50);
        assert_eq!(scale_image(&img, 0.5).unwrap().dimensions(), (51, 25));
        assert_eq!(scale_image(&img, 2.0).unwrap().dimensions(), (202, 100));
        assert_eq!(scale_image(&img, 1.0).unwrap(), img);
    }

    #[test]
    fn scaling_rejects_bad_factors() {
        let img = RgbImage::new(4, 4);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                scale_image(&img, bad),
                Err(AttvisError::InvalidScale(_))
            ));
        }
    }

    #[test]
    fn file_codec_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let img = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        FileCodec.encode(&img, &path).unwrap();
        assert_eq!(FileCodec.decode(&path).unwrap(), img);
        assert!(matches!(
            FileCodec.decode(&dir.path().join("missing.png")),
            Err(AttvisError::Image { .. })
        ));
    }
}
