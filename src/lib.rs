//! Traffic-sign candidate detection.
//!
//! Color segmentation, morphological shape filtering and template
//! re-validation turn a photograph into a binary mask of sign-colored regions
//! plus a list of bounding-box window candidates.

pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;

pub use config::{
    ColorBand, DetectionConfig, MorphologyConfig, SegmentationConfig, ShapeBounds, ShapeMargins,
    ShapeStatistics, ValidationConfig,
};
pub use detection::{
    ColorSegmenter, DetectionPipeline, MorphologicalRefiner, Template, TemplateLibrary,
    TemplateValidator, WindowExtractor,
};
pub use error::{DetectionError, Result};
pub use models::{BoundingBox, DetectionResult, Region, RegionScore, WindowCandidate};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineStep};
