use crate::config::{ColorBand, SegmentationConfig};
use crate::error::{DetectionError, Result};
use image::{GrayImage, Luma, RgbImage};
use tracing::debug;

/// Foreground value of every mask produced by the pipeline.
pub const MASK_ON: u8 = 255;

/// Convert an 8-bit RGB pixel to half-scale HSV.
/// Returns (H: 0-180, S: 0-255, V: 0-255).
#[inline]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(f32::from);

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [(h / 2.0).round() as u8, s.round() as u8, max as u8]
}

/// Marks pixels whose HSV value falls inside any of `bands` (inclusive, per-channel AND).
pub fn segment_bands(image: &RgbImage, bands: &[ColorBand]) -> Result<GrayImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectionError::InvalidInput(format!(
            "cannot segment an empty {width}x{height} image"
        )));
    }

    let mask = GrayImage::from_fn(width, height, |x, y| {
        let hsv = rgb_to_hsv(image.get_pixel(x, y).0);
        if bands.iter().any(|band| band.contains(hsv)) {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    });

    debug!(
        "segmented {}x{} image, {} candidate pixels",
        width,
        height,
        mask.pixels().filter(|p| p[0] == MASK_ON).count()
    );

    Ok(mask)
}

/// Converts an image to HSV and keeps the red and blue sign colors.
#[derive(Debug, Clone, Default)]
pub struct ColorSegmenter {
    config: SegmentationConfig,
}

impl ColorSegmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    pub fn segment(&self, image: &RgbImage) -> Result<GrayImage> {
        segment_bands(image, &self.config.bands())
    }
}
