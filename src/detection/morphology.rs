use crate::config::{MorphologyConfig, ShapeBounds};
use crate::detection::color::MASK_ON;
use crate::detection::contours::{fill_region, find_regions};
use crate::error::{DetectionError, Result};
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, dilate, open};
use tracing::debug;

/// Extract the outer regions of `mask`, fill the ones that pass `bounds` solid
/// and erase the rest. Returns the number of regions kept.
///
/// Regions with a zero extent cannot produce an aspect ratio and are erased.
pub fn filter_regions(mask: &mut GrayImage, bounds: &ShapeBounds) -> usize {
    let regions = find_regions(mask);
    let mut kept = 0;

    for region in &regions {
        let keep = match (region.area(), region.aspect_ratio()) {
            (Some(area), Some(ratio)) => bounds.accepts(area, ratio),
            _ => {
                debug!(
                    "degenerate region at ({}, {}) rejected",
                    region.min_x, region.min_y
                );
                false
            }
        };

        if keep {
            kept += 1;
            fill_region(mask, region, MASK_ON);
        } else {
            fill_region(mask, region, 0);
        }
    }

    debug!("shape filter kept {} of {} regions", kept, regions.len());
    kept
}

/// Cleans a color mask into solid, plausibly shaped sign blobs.
#[derive(Debug, Clone, Default)]
pub struct MorphologicalRefiner {
    morphology: MorphologyConfig,
    bounds: ShapeBounds,
}

impl MorphologicalRefiner {
    pub fn new(morphology: MorphologyConfig, bounds: ShapeBounds) -> Self {
        Self { morphology, bounds }
    }

    pub fn bounds(&self) -> &ShapeBounds {
        &self.bounds
    }

    /// Opening, closing, shape filter, dilation, shape filter.
    pub fn refine(&self, mask: &GrayImage) -> Result<GrayImage> {
        if mask.width() == 0 || mask.height() == 0 {
            return Err(DetectionError::InvalidInput(
                "cannot refine an empty mask".to_string(),
            ));
        }

        let opened = open(mask, Norm::L2, self.morphology.open_radius);
        let mut refined = close(&opened, Norm::L2, self.morphology.close_radius);

        filter_regions(&mut refined, &self.bounds);

        let mut refined = dilate(&refined, Norm::L2, self.morphology.dilate_radius);

        // Dilation can merge neighbours or grow past the bounds
        filter_regions(&mut refined, &self.bounds);

        Ok(refined)
    }
}
