mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from signdet for tests
#[allow(unused_imports)]
pub use signdet::{
    DetectionConfig, DetectionError, DetectionPipeline, MorphologicalRefiner, ShapeBounds,
    TemplateLibrary, TemplateValidator, WindowCandidate,
};
