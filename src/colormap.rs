use image::{GrayImage, Rgb, RgbImage};

/// Turns a normalized 8-bit map into a color image of the same size.
pub trait ColorMapper {
    fn apply(&self, map: &GrayImage) -> RgbImage;
}

/// Blue-to-red "jet" colormap backed by a 256-entry lookup table.
#[derive(Debug, Clone)]
pub struct Jet {
    lut: [Rgb<u8>; 256],
}

impl Jet {
    pub fn new() -> Self {
        let mut lut = [Rgb([0u8; 3]); 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            let v = i as f32 / 255.0;
            let channel = |offset: f32| {
                let c = (1.5 - (4.0 * v - offset).abs()).clamp(0.0, 1.0);
                (c * 255.0).round() as u8
            };
            *entry = Rgb([channel(3.0), channel(2.0), channel(1.0)]);
        }
        Self { lut }
    }

    pub fn color(&self, value: u8) -> Rgb<u8> {
        self.lut[value as usize]
    }
}

impl Default for Jet {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorMapper for Jet {
    fn apply(&self, map: &GrayImage) -> RgbImage {
        let (w, h) = map.dimensions();
        RgbImage::from_fn(w, h, |x, y| self.color(map.get_pixel(x, y).0[0]))
    }
}
