use crate::error::{DetectionError, Result};
use crate::models::{RegionScore, WindowCandidate};
use image::{GrayImage, RgbImage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Data that flows through the pipeline
/// Each stage reads the previous stage's mask and hands on a new one
#[derive(Clone)]
pub struct PipelineData {
    /// The input image (shared, never modified)
    pub image: Arc<RgbImage>,

    /// Candidate mask produced by the latest stage (None before segmentation)
    pub mask: Option<GrayImage>,

    /// Window candidates, filled by the last stage
    pub windows: Vec<WindowCandidate>,

    /// Per-region template scores, filled by validation
    pub scores: Vec<RegionScore>,
}

impl PipelineData {
    pub fn from_image(image: Arc<RgbImage>) -> Self {
        Self {
            image,
            mask: None,
            windows: Vec::new(),
            scores: Vec::new(),
        }
    }

    /// Mask of the previous stage, or an error naming the stage that needed it
    pub fn require_mask(&self, step: &str) -> Result<&GrayImage> {
        self.mask.as_ref().ok_or_else(|| {
            DetectionError::InvalidInput(format!("{step} needs a mask from an earlier stage"))
        })
    }

    pub fn with_mask(mut self, mask: GrayImage) -> Self {
        self.mask = Some(mask);
        self
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Directory receiving one mask image per stage
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            if std::fs::read_dir(&output_dir)?.next().is_some() {
                return Err(DetectionError::InvalidInput(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }
        Ok(Self { output_dir })
    }
}

/// Context available to all pipeline steps
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    pub fn with_debug(debug: DebugConfig) -> Self {
        Self { debug: Some(debug) }
    }

    fn save_debug_mask(&self, step_index: usize, step_name: &str, data: &PipelineData) -> Result<()> {
        let (Some(debug_config), Some(mask)) = (&self.debug, &data.mask) else {
            return Ok(());
        };

        let filename = format!(
            "{:02}_{}.png",
            step_index + 1,
            step_name.to_lowercase().replace(' ', "_")
        );
        mask.save(debug_config.output_dir.join(&filename))?;
        debug!("saved debug mask {}", filename);
        Ok(())
    }
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Consume the previous stage's output and produce this stage's
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step (used in logs and debug file names)
    fn name(&self) -> &str;
}

/// Linear pipeline: every step runs once, in order, with no retries
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Run every step on one image
    pub fn run(&self, image: Arc<RgbImage>, context: &PipelineContext) -> Result<PipelineData> {
        self.run_partial(image, self.steps.len(), context)
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial(
        &self,
        image: Arc<RgbImage>,
        num_steps: usize,
        context: &PipelineContext,
    ) -> Result<PipelineData> {
        let mut data = PipelineData::from_image(image);

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            debug!("running step {}: {}", step_idx + 1, step.name());
            data = step.process(data, context)?;
            context.save_debug_mask(step_idx, step.name(), &data)?;
        }

        Ok(data)
    }
}
