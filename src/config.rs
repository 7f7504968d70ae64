//! Detection configuration
//!
//! Every threshold used by the pipeline lives here as a plain value. A
//! [`DetectionConfig`] is built once and passed by reference into each call.

use crate::error::{DetectionError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Inclusive HSV range. Hue is half-scale (0..=179, with 180 reachable by rounding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorBand {
    pub low: [u8; 3],
    pub high: [u8; 3],
}

impl ColorBand {
    pub const fn new(low: [u8; 3], high: [u8; 3]) -> Self {
        Self { low, high }
    }

    /// Per-channel AND of the inclusive bounds.
    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.low[c] <= hsv[c] && hsv[c] <= self.high[c])
    }

    fn validate(&self, name: &str) -> Result<()> {
        for (c, channel) in ["hue", "saturation", "value"].iter().enumerate() {
            if self.low[c] > self.high[c] {
                return Err(DetectionError::InvalidConfig(format!(
                    "band {name}: {channel} low {} > high {}",
                    self.low[c], self.high[c]
                )));
            }
        }
        Ok(())
    }
}

/// Hue bands whose union marks a pixel as sign-colored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub red1: ColorBand,
    pub red2: ColorBand,
    pub blue: ColorBand,
}

impl SegmentationConfig {
    /// Builds the three bands from hue ranges sharing one saturation and value range.
    pub fn from_hue_ranges(
        red1: (u8, u8),
        red2: (u8, u8),
        blue: (u8, u8),
        saturation: (u8, u8),
        value: (u8, u8),
    ) -> Self {
        let band = |hue: (u8, u8)| {
            ColorBand::new([hue.0, saturation.0, value.0], [hue.1, saturation.1, value.1])
        };
        Self {
            red1: band(red1),
            red2: band(red2),
            blue: band(blue),
        }
    }

    pub fn bands(&self) -> [ColorBand; 3] {
        [self.red1, self.red2, self.blue]
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            red1: ColorBand::new([0, 50, 50], [8, 255, 255]),
            red2: ColorBand::new([177, 50, 50], [181, 255, 255]),
            blue: ColorBand::new([105, 30, 30], [135, 255, 255]),
        }
    }
}

/// Radii of the elliptical structuring elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyConfig {
    pub open_radius: u8,
    pub close_radius: u8,
    pub dilate_radius: u8,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            open_radius: 5,
            close_radius: 10,
            dilate_radius: 10,
        }
    }
}

/// Extremes measured over ground-truth sign annotations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeStatistics {
    pub min_area: f64,
    pub max_area: f64,
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
}

impl Default for ShapeStatistics {
    fn default() -> Self {
        Self {
            min_area: 909.7550000000047,
            max_area: 55919.045,
            min_aspect_ratio: 0.5513618362563639,
            max_aspect_ratio: 1.419828704905269,
        }
    }
}

/// Multiplicative slack applied to [`ShapeStatistics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeMargins {
    pub area_low: f64,
    pub area_high: f64,
    pub aspect_low: f64,
    pub aspect_high: f64,
}

impl Default for ShapeMargins {
    fn default() -> Self {
        Self {
            area_low: 0.75,
            area_high: 1.15,
            aspect_low: 0.75,
            aspect_high: 1.25,
        }
    }
}

/// Strict plausibility gates for a region's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeBounds {
    pub min_area: f64,
    pub max_area: f64,
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
}

impl ShapeBounds {
    pub fn from_statistics(stats: &ShapeStatistics, margins: &ShapeMargins) -> Self {
        Self {
            min_area: stats.min_area * margins.area_low,
            max_area: stats.max_area * margins.area_high,
            min_aspect_ratio: stats.min_aspect_ratio * margins.aspect_low,
            max_aspect_ratio: stats.max_aspect_ratio * margins.aspect_high,
        }
    }

    /// Both comparisons are exclusive: a value equal to a bound is rejected.
    pub fn accepts(&self, area: f64, aspect_ratio: f64) -> bool {
        self.min_aspect_ratio < aspect_ratio
            && aspect_ratio < self.max_aspect_ratio
            && self.min_area < area
            && area < self.max_area
    }

    fn validate(&self) -> Result<()> {
        let finite = [
            self.min_area,
            self.max_area,
            self.min_aspect_ratio,
            self.max_aspect_ratio,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(DetectionError::InvalidConfig(
                "shape bounds must be finite".to_string(),
            ));
        }
        if self.min_area > self.max_area {
            return Err(DetectionError::InvalidConfig(format!(
                "min_area {} > max_area {}",
                self.min_area, self.max_area
            )));
        }
        if self.min_aspect_ratio > self.max_aspect_ratio {
            return Err(DetectionError::InvalidConfig(format!(
                "min_aspect_ratio {} > max_aspect_ratio {}",
                self.min_aspect_ratio, self.max_aspect_ratio
            )));
        }
        Ok(())
    }
}

impl Default for ShapeBounds {
    fn default() -> Self {
        Self::from_statistics(&ShapeStatistics::default(), &ShapeMargins::default())
    }
}

/// Template re-validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub template_match_threshold: f32,
    /// Pixels added on every side of a region before cropping.
    pub padding: u32,
    pub template_dir: PathBuf,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            template_match_threshold: 0.6,
            padding: 30,
            template_dir: "data/templates".into(),
        }
    }
}

/// Main detection configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub segmentation: SegmentationConfig,
    pub morphology: MorphologyConfig,
    pub shape_bounds: ShapeBounds,
    pub validation: ValidationConfig,
}

impl DetectionConfig {
    /// Reads a JSON configuration file; missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.segmentation.red1.validate("red1")?;
        self.segmentation.red2.validate("red2")?;
        self.segmentation.blue.validate("blue")?;
        self.shape_bounds.validate()?;

        let threshold = self.validation.template_match_threshold;
        if !threshold.is_finite() {
            return Err(DetectionError::InvalidConfig(format!(
                "template_match_threshold must be finite, got {threshold}"
            )));
        }
        Ok(())
    }
}
