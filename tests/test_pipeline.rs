//! End-to-end tests for the detection pipeline.
//!
//! Tests cover:
//! - Black image, single sign, undersized sign and two-sign scenes
//! - Regions touching the left image edge
//! - Every mask pixel is covered by a window
//! - Output mask shape and values
//! - Batch processing independence and stage debug dumps
//! - Configuration loading

mod common;

use common::*;
use signdet::{DebugConfig, PipelineContext};
use std::sync::Arc;

fn pipeline() -> DetectionPipeline {
    DetectionPipeline::with_library(DetectionConfig::default(), triangle_library())
        .expect("default configuration is valid")
}

#[test]
fn test_black_image_yields_nothing() -> anyhow::Result<()> {
    let image = black_image(200, 150);
    let result = pipeline().detect(&image)?;

    assert_eq!(result.mask.dimensions(), (200, 150));
    assert_eq!(foreground_count(&result.mask), 0);
    assert!(result.windows.is_empty());
    assert!(result.scores.is_empty());
    Ok(())
}

#[test]
fn test_single_triangle_yields_one_window() -> anyhow::Result<()> {
    let triangle = large_triangle(0);
    let image = triangle_scene(&triangle);
    let result = pipeline().detect(&image)?;

    assert_eq!(result.mask.dimensions(), image.dimensions());
    assert!(is_binary(&result.mask));
    assert_eq!(result.windows.len(), 1);

    // The final mask is dilated around the opened triangle, so the window may
    // differ from the drawn triangle by a few pixels on each side
    let (x_min, y_min, x_max, y_max) = polygon_bounds(&triangle);
    let window = result.windows[0];
    let close = |a: u32, b: u32| a.abs_diff(b) <= 12;
    assert!(close(window.x_min, x_min), "{window:?}");
    assert!(close(window.y_min, y_min), "{window:?}");
    assert!(close(window.x_max, x_max), "{window:?}");
    assert!(close(window.y_max, y_max), "{window:?}");
    assert!(window.contains(52, 60));
    Ok(())
}

#[test]
fn test_undersized_triangle_yields_nothing() -> anyhow::Result<()> {
    let image = triangle_scene(&small_triangle(0));
    let result = pipeline().detect(&image)?;

    assert!(result.windows.is_empty());
    assert_eq!(foreground_count(&result.mask), 0);
    Ok(())
}

#[test]
fn test_two_triangles_yield_two_disjoint_windows() -> anyhow::Result<()> {
    let image = two_triangle_scene();
    let result = pipeline().detect(&image)?;

    assert_eq!(result.windows.len(), 2);
    assert!(!result.windows[0].overlaps(&result.windows[1]));

    // Order is unspecified; compare as a set of tile indices
    let mut tiles: Vec<u32> = result.windows.iter().map(|w| w.y_min / TILE).collect();
    tiles.sort();
    assert_eq!(tiles, vec![0, 1]);
    Ok(())
}

#[test]
fn test_oversized_blob_on_left_edge_is_erased() -> anyhow::Result<()> {
    let image = oversized_left_edge_scene();
    let result = pipeline().detect(&image)?;

    assert_eq!(result.mask.dimensions(), image.dimensions());
    assert_eq!(foreground_count(&result.mask), 0);
    assert!(result.windows.is_empty());
    Ok(())
}

#[test]
fn test_triangle_on_left_edge_yields_one_window() -> anyhow::Result<()> {
    let image = left_edge_triangle_scene();
    let pipeline =
        DetectionPipeline::with_library(DetectionConfig::default(), scene_library(&image))?;
    let result = pipeline.detect(&image)?;

    assert_eq!(result.windows.len(), 1);
    assert_eq!(result.windows[0].x_min, 0);
    assert!(result.windows[0].contains(20, 60));
    assert!(mask_covered_by_windows(&result.mask, &result.windows));
    Ok(())
}

#[test]
fn test_mask_pixels_lie_inside_windows() -> anyhow::Result<()> {
    let scenes = [
        triangle_scene(&large_triangle(0)),
        two_triangle_scene(),
        triangle_and_square_scene(),
        oversized_left_edge_scene(),
        black_image(50, 50),
    ];

    for image in &scenes {
        let result = pipeline().detect(image)?;
        assert!(is_binary(&result.mask));
        assert!(mask_covered_by_windows(&result.mask, &result.windows));
    }
    Ok(())
}

#[test]
fn test_strict_threshold_rejects_everything() -> anyhow::Result<()> {
    let mut config = DetectionConfig::default();
    config.validation.template_match_threshold = 1.5;
    let pipeline = DetectionPipeline::with_library(config, triangle_library())?;

    let result = pipeline.detect(&two_triangle_scene())?;
    assert!(result.windows.is_empty());
    assert_eq!(foreground_count(&result.mask), 0);
    assert_eq!(result.scores.len(), 2);
    assert!(result.scores.iter().all(|s| !s.accepted));
    Ok(())
}

#[test]
fn test_batch_results_are_independent() {
    let images = vec![
        triangle_scene(&large_triangle(0)),
        black_image(0, 0),
        two_triangle_scene(),
    ];

    let results = pipeline().detect_batch(&images);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().map(|r| r.windows.len()).ok(), Some(1));
    assert!(matches!(results[1], Err(DetectionError::InvalidInput(_))));
    assert_eq!(results[2].as_ref().map(|r| r.windows.len()).ok(), Some(2));
}

#[test]
fn test_pipeline_is_shareable_across_threads() {
    let pipeline = Arc::new(pipeline());
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            std::thread::spawn(move || {
                pipeline
                    .detect(&two_triangle_scene())
                    .map(|r| r.windows.len())
                    .ok()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().ok().flatten(), Some(2));
    }
}

#[test]
fn test_debug_dump_writes_one_mask_per_stage() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug_dir = dir.path().join("stages");
    let context = PipelineContext::with_debug(DebugConfig::new(debug_dir.clone())?);

    pipeline().detect_with_context(&triangle_scene(&large_triangle(0)), &context)?;

    let mut names: Vec<String> = std::fs::read_dir(&debug_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "01_color_segmentation.png",
            "02_morphological_refinement.png",
            "03_template_validation.png",
            "04_window_extraction.png",
        ]
    );

    // A used directory cannot be reused
    assert!(DebugConfig::new(debug_dir).is_err());
    Ok(())
}

#[test]
fn test_missing_template_dir_fails_pipeline_construction() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let mut config = DetectionConfig::default();
    config.validation.template_dir = dir.path().to_path_buf();

    let result = DetectionPipeline::new(config);
    assert!(matches!(result, Err(DetectionError::NoTemplatesLoaded { .. })));
    Ok(())
}

#[test]
fn test_pipeline_loads_templates_from_config() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    triangle_template().save(dir.path().join("triangle.png"))?;

    let mut config = DetectionConfig::default();
    config.validation.template_dir = dir.path().to_path_buf();
    let pipeline = DetectionPipeline::new(config)?;

    assert_eq!(pipeline.library().len(), 1);
    let result = pipeline.detect(&triangle_scene(&large_triangle(0)))?;
    assert_eq!(result.windows.len(), 1);
    Ok(())
}

#[test]
fn test_config_file_overrides_defaults() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "validation": { "template_match_threshold": 0.75, "padding": 12 },
            "morphology": { "open_radius": 3 }
        }"#,
    )?;

    let config = DetectionConfig::load(&path)?;
    assert_eq!(config.validation.template_match_threshold, 0.75);
    assert_eq!(config.validation.padding, 12);
    assert_eq!(config.morphology.open_radius, 3);
    assert_eq!(config.morphology.close_radius, 10);
    assert_eq!(config.shape_bounds, ShapeBounds::default());
    Ok(())
}

#[test]
fn test_inverted_bounds_are_rejected() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "segmentation": { "blue": { "low": [135, 30, 30], "high": [105, 255, 255] } } }"#,
    )?;
    assert!(matches!(
        DetectionConfig::load(&path),
        Err(DetectionError::InvalidConfig(_))
    ));

    let mut config = DetectionConfig::default();
    config.shape_bounds.min_area = config.shape_bounds.max_area + 1.0;
    assert!(matches!(
        DetectionPipeline::with_library(config, triangle_library()),
        Err(DetectionError::InvalidConfig(_))
    ));
    Ok(())
}

#[test]
fn test_default_shape_bounds_carry_margins() {
    let bounds = ShapeBounds::default();
    assert!((bounds.min_area - 909.7550000000047 * 0.75).abs() < 1e-9);
    assert!((bounds.max_area - 55919.045 * 1.15).abs() < 1e-9);
    assert!((bounds.min_aspect_ratio - 0.5513618362563639 * 0.75).abs() < 1e-12);
    assert!((bounds.max_aspect_ratio - 1.419828704905269 * 1.25).abs() < 1e-12);
}
