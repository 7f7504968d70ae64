use crate::detection::contours::find_regions;
use crate::models::{Region, WindowCandidate};
use image::GrayImage;

/// Bounding boxes of the outer regions of a final mask, in discovery order.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowExtractor;

impl WindowExtractor {
    pub fn extract(&self, mask: &GrayImage) -> Vec<WindowCandidate> {
        find_regions(mask).iter().map(Region::window).collect()
    }
}
