//! Raster shown under the annotation layer.
//!
//! Either decoded from a file with the `image` crate or generated in memory,
//! so the viewer always has something to annotate.

use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::ColorImage;
use image::{Rgba, RgbaImage};

/// Size of the generated sample image.
pub const SAMPLE_WIDTH: u32 = 451;
pub const SAMPLE_HEIGHT: u32 = 300;

/// A decoded RGBA raster plus a display name.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub name: String,
    pub pixels: RgbaImage,
}

impl RasterImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Convert to the texture format egui uploads.
    pub fn to_color_image(&self) -> ColorImage {
        let size = [self.width() as usize, self.height() as usize];
        ColorImage::from_rgba_unmultiplied(size, self.pixels.as_raw())
    }
}

/// Decode an image file (PNG or JPEG).
pub fn load_image(path: &Path) -> Result<RasterImage> {
    let decoded = image::open(path)
        .with_context(|| format!("decoding image {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(RasterImage {
        name,
        pixels: decoded.to_rgba8(),
    })
}

/// Deterministic sample image: a warm radial gradient with concentric rings
/// and a darker horizon band, giving the annotation tools visible features.
pub fn sample_image() -> RasterImage {
    let (w, h) = (SAMPLE_WIDTH as f32, SAMPLE_HEIGHT as f32);
    let (cx, cy) = (w * 0.42, h * 0.45);
    let max_r = (w * w + h * h).sqrt() / 2.0;

    let pixels = RgbaImage::from_fn(SAMPLE_WIDTH, SAMPLE_HEIGHT, |x, y| {
        let (fx, fy) = (x as f32, y as f32);
        let r = ((fx - cx).powi(2) + (fy - cy).powi(2)).sqrt() / max_r;
        let ring = if (r * 18.0).fract() < 0.08 { 0.75 } else { 1.0 };
        let horizon = if fy > h * 0.78 { 0.55 } else { 1.0 };
        let shade = (1.0 - r).clamp(0.0, 1.0) * ring * horizon;

        Rgba([
            (60.0 + 195.0 * shade) as u8,
            (40.0 + 150.0 * shade * shade) as u8,
            (30.0 + 70.0 * (fx / w)) as u8,
            255,
        ])
    });

    RasterImage {
        name: "sample".to_string(),
        pixels,
    }
}
