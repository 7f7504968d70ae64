use image::GrayImage;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Outer boundary of one connected mask component.
#[derive(Debug, Clone)]
pub struct Region {
    /// Boundary pixels in tracing order.
    pub points: Vec<Point<i32>>,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Region {
    /// Returns `None` for an empty boundary.
    pub fn from_points(points: Vec<Point<i32>>) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            points,
            min_x: min_x.max(0) as u32,
            min_y: min_y.max(0) as u32,
            max_x: max_x.max(0) as u32,
            max_y: max_y.max(0) as u32,
        })
    }

    /// Vertical extent (`y_max - y_min`); carries the "width" label in the shape gates.
    pub fn width(&self) -> u32 {
        self.max_y - self.min_y
    }

    /// Horizontal extent (`x_max - x_min`); carries the "height" label in the shape gates.
    pub fn height(&self) -> u32 {
        self.max_x - self.min_x
    }

    /// Bounding-box area, or `None` when either extent is zero.
    pub fn area(&self) -> Option<f64> {
        if self.is_degenerate() {
            return None;
        }
        Some(self.width() as f64 * self.height() as f64)
    }

    /// `height / width`, or `None` when either extent is zero.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.is_degenerate() {
            return None;
        }
        Some(self.height() as f64 / self.width() as f64)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn window(&self) -> WindowCandidate {
        WindowCandidate {
            y_min: self.min_y,
            x_min: self.min_x,
            y_max: self.max_y,
            x_max: self.max_x,
        }
    }
}

/// Axis-aligned bounding box in image pixel coordinates (inclusive corners).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowCandidate {
    pub y_min: u32,
    pub x_min: u32,
    pub y_max: u32,
    pub x_max: u32,
}

impl WindowCandidate {
    /// `(y_min, x_min, y_max, x_max)`
    pub fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.y_min, self.x_min, self.y_max, self.x_max)
    }

    pub fn overlaps(&self, other: &WindowCandidate) -> bool {
        self.x_min <= other.x_max
            && other.x_min <= self.x_max
            && self.y_min <= other.y_max
            && other.y_min <= self.y_max
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }
}

/// Bounding box in the original image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Outcome of comparing one region against the template library.
#[derive(Debug, Clone, Serialize)]
pub struct RegionScore {
    /// Bounding box of the region on the mask.
    pub window: WindowCandidate,
    /// Padded crop actually compared.
    pub crop: BoundingBox,
    /// Best normalized cross-correlation over all templates; `None` if nothing could be scored.
    pub score: Option<f32>,
    pub accepted: bool,
}

/// Final output for one image.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Same dimensions as the input image, values 0 or 255.
    pub mask: GrayImage,
    pub windows: Vec<WindowCandidate>,
    pub scores: Vec<RegionScore>,
}
