use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use weedmap::detect::{InferenceParams, WeedDetector};
use weedmap::{CornerCoords, PipelineConfig, UploadTarget, WeedPipeline};

#[derive(Parser)]
#[command(name = "weedmap")]
#[command(about = "Detect weeds in aerial imagery and export GIS shapefiles")]
struct Cli {
    /// Input raster: a georeferenced GeoTIFF, or a plain PNG/JPEG together
    /// with --corners
    #[arg(value_name = "RASTER")]
    raster: PathBuf,

    /// Four "lon, lat" image corners (top-left, top-right, bottom-right,
    /// bottom-left). Switches to plain-image mode: no tiling, bilinear
    /// projection. A bare `--corners` uses the orchard survey defaults
    #[arg(
        long,
        num_args = 0..=4,
        value_name = "LON,LAT",
        allow_hyphen_values = true,
        default_missing_values = [
            "-48.8864783, -20.5906375",
            "-48.8855653, -20.5906264",
            "-48.8855534, -20.5914861",
            "-48.8864664, -20.5914973",
        ]
    )]
    corners: Option<Vec<String>>,

    /// Path to the ONNX detection model
    #[arg(long, value_name = "MODEL")]
    model: Option<PathBuf>,

    /// Tile edge length in pixels
    #[arg(long, default_value_t = 3000)]
    tile_size: u32,

    /// Output archive path
    #[arg(short, long, default_value = "weed_detections.zip")]
    output: PathBuf,

    /// Model inference size
    #[arg(long, default_value_t = 640)]
    imgsz: u32,

    /// Confidence threshold
    #[arg(long, default_value_t = 0.2)]
    conf: f32,

    /// IoU threshold for NMS
    #[arg(long, default_value_t = 0.4)]
    iou: f32,

    /// Save annotated tile images to this directory
    #[arg(long, value_name = "DIR")]
    annotate: Option<PathBuf>,

    /// Upload the archive to remote storage as BUCKET:PATH
    #[arg(long, value_name = "BUCKET:PATH")]
    upload: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let params = InferenceParams {
        image_size: args.imgsz,
        confidence: args.conf,
        iou: args.iou,
    };
    let detector = build_detector(&args, &params)?;

    let upload = args
        .upload
        .as_deref()
        .map(|spec| {
            let (bucket, destination) = spec
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("--upload expects BUCKET:PATH, got {spec:?}"))?;
            anyhow::Ok(UploadTarget {
                destination: destination.to_owned(),
                bucket: bucket.to_owned(),
            })
        })
        .transpose()?;

    let config = PipelineConfig {
        tile_size: args.tile_size,
        inference: params,
        archive_path: args.output.clone(),
        annotated_dir: args.annotate.clone(),
        upload,
        ..PipelineConfig::default()
    };
    let pipeline = WeedPipeline::new(detector, config);

    let report = match &args.corners {
        Some(corners) => {
            let corners = parse_corners(corners)?;
            pipeline.run_plain_image(&args.raster, corners)?
        }
        None => pipeline.run_file(&args.raster)?,
    };

    println!(
        "{} weed polygons from {} tiles written to {:?}",
        report.features, report.tiles, report.archive_path
    );
    if report.skipped > 0 {
        println!("{} degenerate detections skipped", report.skipped);
    }

    Ok(())
}

fn parse_corners(corners: &[String]) -> anyhow::Result<CornerCoords> {
    anyhow::ensure!(
        corners.len() == 4,
        "--corners expects exactly 4 values, got {}",
        corners.len()
    );
    Ok(CornerCoords {
        top_left: corners[0].parse()?,
        top_right: corners[1].parse()?,
        bottom_right: corners[2].parse()?,
        bottom_left: corners[3].parse()?,
    })
}

#[cfg(feature = "backend-tract")]
fn build_detector(args: &Cli, params: &InferenceParams) -> anyhow::Result<Arc<dyn WeedDetector>> {
    use weedmap::detect::TractDetector;

    let model_path = args
        .model
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("--model is required"))?;
    let detector = TractDetector::new(model_path, params.image_size)?;
    Ok(Arc::new(detector))
}

#[cfg(not(feature = "backend-tract"))]
fn build_detector(args: &Cli, _params: &InferenceParams) -> anyhow::Result<Arc<dyn WeedDetector>> {
    let _ = &args.model;
    anyhow::bail!("no inference backend compiled in; rebuild with --features backend-tract")
}
