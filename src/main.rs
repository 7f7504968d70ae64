use anyhow::Context;
use clap::Parser;
use image::ImageReader;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use signdet::{DebugConfig, DetectionConfig, DetectionPipeline, PipelineContext, WindowCandidate};

#[derive(Parser)]
#[command(name = "signdet")]
#[command(about = "Detect traffic-sign candidate regions in images")]
struct Cli {
    /// Image file, or a directory of images
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// JSON configuration file (defaults are used for missing fields)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory of reference shape templates
    #[arg(short, long, value_name = "DIR")]
    templates: Option<PathBuf>,

    /// Override the template match threshold
    #[arg(long)]
    threshold: Option<f32>,

    /// Write `mask.<name>.png` for every image into this directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Save per-stage masks to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct ImageReport<'a> {
    image: &'a str,
    windows: Vec<(u32, u32, u32, u32)>,
}

fn collect_inputs(input: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(input)
        .with_context(|| format!("Failed to read input directory: {}", input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_lowercase().as_str(), "jpg" | "jpeg" | "png" | "bmp"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => DetectionConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => DetectionConfig::default(),
    };
    if let Some(dir) = args.templates {
        config.validation.template_dir = dir;
    }
    if let Some(threshold) = args.threshold {
        config.validation.template_match_threshold = threshold;
    }

    let pipeline = DetectionPipeline::new(config).context("Failed to build detection pipeline")?;

    if let Some(dir) = &args.output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    }
    if let Some(dir) = &args.debug_out {
        // Fail early on a non-empty directory, before any image is processed
        DebugConfig::new(dir.clone())?;
    }

    let inputs = collect_inputs(&args.input)?;
    tracing::info!("processing {} images", inputs.len());

    let mut failures = 0;
    for path in &inputs {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let image = match ImageReader::open(path)
            .with_context(|| format!("Failed to open image: {}", path.display()))
            .and_then(|r| {
                r.decode()
                    .with_context(|| format!("Failed to decode image: {}", path.display()))
            }) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                tracing::warn!("{:#}", e);
                failures += 1;
                continue;
            }
        };

        let context = match &args.debug_out {
            Some(dir) => PipelineContext::with_debug(DebugConfig::new(dir.join(&stem))?),
            None => PipelineContext::default(),
        };

        let result = match pipeline.detect_with_context(&image, &context) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("{}: {}", path.display(), e);
                failures += 1;
                continue;
            }
        };

        if let Some(dir) = &args.output {
            let mask_path = dir.join(format!("mask.{stem}.png"));
            result
                .mask
                .save(&mask_path)
                .with_context(|| format!("Failed to save mask: {}", mask_path.display()))?;
        }

        let report = ImageReport {
            image: &stem,
            windows: result.windows.iter().map(WindowCandidate::as_tuple).collect(),
        };
        println!("{}", serde_json::to_string(&report)?);
    }

    if failures > 0 {
        tracing::warn!("{} of {} images failed", failures, inputs.len());
    }

    Ok(())
}
