use crate::detection::color::ColorSegmenter;
use crate::detection::morphology::MorphologicalRefiner;
use crate::detection::templates::TemplateValidator;
use crate::detection::windows::WindowExtractor;
use crate::error::Result;
use crate::pipeline::{PipelineContext, PipelineData, PipelineStep};
use tracing::debug;

/// Color segmentation into a candidate pixel mask
pub struct SegmentStep {
    pub segmenter: ColorSegmenter,
}

impl PipelineStep for SegmentStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let mask = self.segmenter.segment(&data.image)?;
        Ok(data.with_mask(mask))
    }

    fn name(&self) -> &str {
        "Color Segmentation"
    }
}

/// Morphological cleanup and shape filtering
pub struct RefineStep {
    pub refiner: MorphologicalRefiner,
}

impl PipelineStep for RefineStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let refined = self.refiner.refine(data.require_mask(self.name())?)?;
        Ok(data.with_mask(refined))
    }

    fn name(&self) -> &str {
        "Morphological Refinement"
    }
}

/// Template re-validation of surviving regions
pub struct ValidateStep {
    pub validator: TemplateValidator,
}

impl PipelineStep for ValidateStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let validation = self
            .validator
            .validate(&data.image, data.require_mask(self.name())?)?;

        debug!(
            "{} of {} regions passed template validation",
            validation.accepted.len(),
            validation.scores.len()
        );

        let mut data = data.with_mask(validation.mask);
        data.scores = validation.scores;
        Ok(data)
    }

    fn name(&self) -> &str {
        "Template Validation"
    }
}

/// Bounding boxes of the final regions
pub struct ExtractStep {
    pub extractor: WindowExtractor,
}

impl PipelineStep for ExtractStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        data.windows = self.extractor.extract(data.require_mask(self.name())?);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Window Extraction"
    }
}
