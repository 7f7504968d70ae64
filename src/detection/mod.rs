pub mod color;
pub mod contours;
pub mod morphology;
pub mod steps;
pub mod templates;
pub mod windows;

use crate::config::DetectionConfig;
use crate::error::{DetectionError, Result};
use crate::models::DetectionResult;
use crate::pipeline::{Pipeline, PipelineContext};
use image::RgbImage;
use std::sync::Arc;
use tracing::info;

pub use color::ColorSegmenter;
pub use morphology::MorphologicalRefiner;
pub use templates::{Template, TemplateLibrary, TemplateValidator};
pub use windows::WindowExtractor;

/// Main detection pipeline orchestrator
///
/// Segment, refine, validate, extract. Holds only immutable configuration and the
/// shared template library, so one instance can serve many images (and threads).
#[derive(Clone)]
pub struct DetectionPipeline {
    config: DetectionConfig,
    library: Arc<TemplateLibrary>,
    pipeline: Pipeline,
}

impl DetectionPipeline {
    /// Build a pipeline, loading templates from `config.validation.template_dir`.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        let library = TemplateLibrary::load_dir(&config.validation.template_dir)?;
        Self::with_library(config, Arc::new(library))
    }

    /// Build a pipeline around an already loaded template library.
    pub fn with_library(config: DetectionConfig, library: Arc<TemplateLibrary>) -> Result<Self> {
        config.validate()?;
        let pipeline = build_standard_pipeline(&config, Arc::clone(&library));
        Ok(Self {
            config,
            library,
            pipeline,
        })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn library(&self) -> &Arc<TemplateLibrary> {
        &self.library
    }

    /// Run the full detection pipeline on an image
    pub fn detect(&self, image: &RgbImage) -> Result<DetectionResult> {
        self.detect_with_context(image, &PipelineContext::default())
    }

    /// Run the full pipeline, dumping each stage's mask if the context asks for it
    pub fn detect_with_context(
        &self,
        image: &RgbImage,
        context: &PipelineContext,
    ) -> Result<DetectionResult> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidInput(format!(
                "empty {width}x{height} image"
            )));
        }

        let data = self.pipeline.run(Arc::new(image.clone()), context)?;
        let mask = data.mask.ok_or_else(|| {
            DetectionError::InvalidInput("pipeline produced no mask".to_string())
        })?;

        info!(
            "{}x{} image: {} window candidates ({} regions scored)",
            width,
            height,
            data.windows.len(),
            data.scores.len()
        );

        Ok(DetectionResult {
            mask,
            windows: data.windows,
            scores: data.scores,
        })
    }

    /// Detect on every image independently; one failure does not affect the others.
    #[cfg(feature = "parallel")]
    pub fn detect_batch(&self, images: &[RgbImage]) -> Vec<Result<DetectionResult>> {
        use rayon::prelude::*;
        images.par_iter().map(|image| self.detect(image)).collect()
    }

    /// Detect on every image independently; one failure does not affect the others.
    #[cfg(not(feature = "parallel"))]
    pub fn detect_batch(&self, images: &[RgbImage]) -> Vec<Result<DetectionResult>> {
        images.iter().map(|image| self.detect(image)).collect()
    }
}

/// Build the standard four-stage pipeline from a configuration
pub fn build_standard_pipeline(config: &DetectionConfig, library: Arc<TemplateLibrary>) -> Pipeline {
    use crate::detection::steps::*;

    Pipeline::new()
        .add_step(Arc::new(SegmentStep {
            segmenter: ColorSegmenter::new(config.segmentation.clone()),
        }))
        .add_step(Arc::new(RefineStep {
            refiner: MorphologicalRefiner::new(config.morphology, config.shape_bounds),
        }))
        .add_step(Arc::new(ValidateStep {
            validator: TemplateValidator::new(
                library,
                config.validation.template_match_threshold,
                config.validation.padding,
            ),
        }))
        .add_step(Arc::new(ExtractStep {
            extractor: WindowExtractor,
        }))
}
