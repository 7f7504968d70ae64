//! Template re-validation of candidate regions
//!
//! Reference shapes are loaded once into a [`TemplateLibrary`] and shared
//! read-only; each candidate region is cropped with padding and compared against
//! every template with zero-mean normalized cross-correlation.

use crate::detection::contours::{fill_region, find_regions};
use crate::error::{DetectionError, Result};
use crate::models::{BoundingBox, Region, RegionScore, WindowCandidate};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A named grayscale reference shape.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub image: GrayImage,
}

/// Immutable set of reference templates.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    source: PathBuf,
    templates: Vec<Template>,
}

impl TemplateLibrary {
    /// Load every decodable image in `dir` as grayscale, in file-name order.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            DetectionError::InvalidInput(format!(
                "cannot read template directory {}: {e}",
                dir.display()
            ))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut templates = Vec::new();
        for path in paths {
            match image::open(&path) {
                Ok(img) => {
                    let name = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    debug!("loaded template {:?} ({}x{})", name, img.width(), img.height());
                    templates.push(Template {
                        name,
                        image: img.to_luma8(),
                    });
                }
                Err(e) => warn!("skipping template {}: {}", path.display(), e),
            }
        }

        let library = Self::from_templates(dir, templates)?;
        info!(
            "loaded {} templates from {}",
            library.len(),
            library.source.display()
        );
        Ok(library)
    }

    /// Build a library from in-memory templates; `source` only labels errors.
    pub fn from_templates<P: Into<PathBuf>>(source: P, templates: Vec<Template>) -> Result<Self> {
        let source = source.into();
        let templates: Vec<Template> = templates
            .into_iter()
            .filter(|t| t.image.width() > 0 && t.image.height() > 0)
            .collect();
        if templates.is_empty() {
            return Err(DetectionError::NoTemplatesLoaded { dir: source });
        }
        Ok(Self { source, templates })
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Zero-mean normalized cross-correlation of `template` slid over `image`.
///
/// Returns the best score over all placements, or `None` when the template
/// does not fit or no placement yields a finite score. A flat window or a flat
/// template scores 0.
pub fn best_correlation(image: &GrayImage, template: &GrayImage) -> Option<f32> {
    let (iw, ih) = image.dimensions();
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > iw || th > ih {
        return None;
    }

    let n = (tw * th) as f64;
    let t: Vec<f64> = template.pixels().map(|p| p[0] as f64).collect();
    let t_mean = t.iter().sum::<f64>() / n;
    let t_centered: Vec<f64> = t.iter().map(|v| v - t_mean).collect();
    let t_norm = t_centered.iter().map(|v| v * v).sum::<f64>().sqrt();

    let mut best: Option<f32> = None;
    for oy in 0..=(ih - th) {
        for ox in 0..=(iw - tw) {
            let mut sum = 0.0;
            let mut sum_sq = 0.0;
            let mut cross = 0.0;
            for ty in 0..th {
                for tx in 0..tw {
                    let v = image.get_pixel(ox + tx, oy + ty)[0] as f64;
                    sum += v;
                    sum_sq += v * v;
                    cross += v * t_centered[(ty * tw + tx) as usize];
                }
            }
            let w_var = sum_sq - sum * sum / n;
            let denom = w_var.max(0.0).sqrt() * t_norm;
            let score = if denom <= f64::EPSILON { 0.0 } else { cross / denom };
            if !score.is_finite() {
                continue;
            }
            let score = score as f32;
            if best.is_none_or(|b| score > b) {
                best = Some(score);
            }
        }
    }
    best
}

/// Padded crop around a region, clamped to the image. The far edge is exclusive.
pub fn padded_crop(region: &Region, padding: u32, width: u32, height: u32) -> BoundingBox {
    let x0 = region.min_x.saturating_sub(padding);
    let y0 = region.min_y.saturating_sub(padding);
    let x1 = region.max_x.saturating_add(padding).min(width);
    let y1 = region.max_y.saturating_add(padding).min(height);
    BoundingBox {
        x: x0,
        y: y0,
        width: x1.saturating_sub(x0),
        height: y1.saturating_sub(y0),
    }
}

/// Output of [`TemplateValidator::validate`].
#[derive(Debug, Clone)]
pub struct Validation {
    pub mask: GrayImage,
    pub accepted: Vec<WindowCandidate>,
    pub scores: Vec<RegionScore>,
}

/// Rejects mask regions that do not resemble any reference template.
#[derive(Debug, Clone)]
pub struct TemplateValidator {
    library: Arc<TemplateLibrary>,
    threshold: f32,
    padding: u32,
}

impl TemplateValidator {
    pub fn new(library: Arc<TemplateLibrary>, threshold: f32, padding: u32) -> Self {
        Self {
            library,
            threshold,
            padding,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Best score of a grayscale crop over all templates.
    ///
    /// Each template is resized to a square whose side is the crop's smaller dimension.
    pub fn score_crop(&self, crop: &GrayImage) -> Option<f32> {
        let side = crop.width().min(crop.height());
        if side == 0 {
            return None;
        }

        let mut best: Option<f32> = None;
        for template in self.library.templates() {
            let resized = imageops::resize(&template.image, side, side, FilterType::CatmullRom);
            if let Some(score) = best_correlation(crop, &resized) {
                debug!("template {:?} scored {:.3}", template.name, score);
                if best.is_none_or(|b| score > b) {
                    best = Some(score);
                }
            }
        }
        best
    }

    /// Score every outer region of `mask` against the library and erase the ones
    /// below the threshold. The input mask is left untouched.
    pub fn validate(&self, image: &RgbImage, mask: &GrayImage) -> Result<Validation> {
        if image.dimensions() != mask.dimensions() {
            return Err(DetectionError::InvalidInput(format!(
                "image is {:?} but mask is {:?}",
                image.dimensions(),
                mask.dimensions()
            )));
        }
        if self.library.is_empty() {
            return Err(DetectionError::NoTemplatesLoaded {
                dir: self.library.source().to_path_buf(),
            });
        }

        let (width, height) = image.dimensions();
        let mut filtered = mask.clone();
        let mut scores = Vec::new();

        for region in find_regions(mask) {
            let crop = padded_crop(&region, self.padding, width, height);
            let score = if crop.is_empty() {
                None
            } else {
                let sub = imageops::crop_imm(image, crop.x, crop.y, crop.width, crop.height).to_image();
                let gray = DynamicImage::ImageRgb8(sub).to_luma8();
                self.score_crop(&gray)
            };

            let accepted = score.is_some_and(|s| s >= self.threshold);
            if !accepted {
                fill_region(&mut filtered, &region, 0);
            }
            debug!(
                "region {:?} score {:?} -> {}",
                region.window().as_tuple(),
                score,
                if accepted { "kept" } else { "rejected" }
            );

            scores.push(RegionScore {
                window: region.window(),
                crop,
                score,
                accepted,
            });
        }

        let accepted = find_regions(&filtered).iter().map(Region::window).collect();

        Ok(Validation {
            mask: filtered,
            accepted,
            scores,
        })
    }
}
