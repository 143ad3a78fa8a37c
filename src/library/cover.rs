//! Decoded cover images, downscaled for terminal rendering.

use std::path::Path;

use image::imageops::FilterType;

/// A small RGB bitmap. Rows are stored top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverArt {
    pub width: u32,
    pub height: u32,
    pixels: Vec<[u8; 3]>,
}

impl CoverArt {
    /// Decode an encoded image (JPEG/PNG/WebP) and fit it into `size`x`size`,
    /// keeping the aspect ratio.
    pub fn decode(bytes: &[u8], size: u32) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::fit(img, size))
    }

    pub fn open(path: &Path, size: u32) -> Result<Self, image::ImageError> {
        let img = image::open(path)?;
        Ok(Self::fit(img, size))
    }

    fn fit(img: image::DynamicImage, size: u32) -> Self {
        let rgb = img.resize(size, size, FilterType::Triangle).to_rgb8();
        let (width, height) = rgb.dimensions();
        let pixels = rgb.pixels().map(|p| p.0).collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}
