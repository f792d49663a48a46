//! Pipeline orchestrator.
//!
//! Sequences tiling, per-tile detection, projection, the vector sink, and
//! archive bundling over one raster. Tiles are processed sequentially in
//! row-major order because record ids depend on visitation order. Each run
//! owns its working storage (a temp dir holding the shapefile triple) and
//! releases it on every path; only the zip archive survives the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::DynamicImage;

use crate::archive::bundle_shapefile;
use crate::detect::{DetectionAdapter, InferenceParams, WeedDetector, annotate};
use crate::error::PipelineError;
use crate::geo::affine::AffineTransform;
use crate::geo::project::{project_affine, project_corners};
use crate::models::{CornerCoords, SceneClass};
use crate::notify::{Milestone, Notifier};
use crate::raster::{RasterSource, RasterTile, tile_raster};
use crate::sink::ShapefileSink;
use crate::upload::ArchiveUploader;

/// Cooperative cancellation flag, checked between tile iterations. A cancel
/// requested mid-inference takes effect before the next tile starts.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Where to put the archive in remote storage, if uploading at all.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    pub destination: String,
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Edge length of the square tiles cut from the raster.
    pub tile_size: u32,
    pub inference: InferenceParams,
    pub target_class: SceneClass,
    /// Base name for the shapefile components inside the archive.
    pub base_name: String,
    /// Where the zip archive is written.
    pub archive_path: PathBuf,
    /// Save annotated copies of each tile here, when set.
    pub annotated_dir: Option<PathBuf>,
    pub upload: Option<UploadTarget>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tile_size: 3000,
            inference: InferenceParams::default(),
            target_class: SceneClass::Weeds,
            base_name: "weed_detections".to_owned(),
            archive_path: PathBuf::from("weed_detections.zip"),
            annotated_dir: None,
            upload: None,
        }
    }
}

/// Summary of one completed run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub archive_path: PathBuf,
    pub tiles: usize,
    /// Polygons written to the vector output.
    pub features: usize,
    /// Detections dropped because their box was degenerate.
    pub skipped: usize,
}

pub struct WeedPipeline {
    adapter: DetectionAdapter,
    config: PipelineConfig,
    notifier: Notifier,
    cancel: CancelToken,
    uploader: Option<Box<dyn ArchiveUploader>>,
}

impl WeedPipeline {
    pub fn new(detector: Arc<dyn WeedDetector>, config: PipelineConfig) -> Self {
        let adapter = DetectionAdapter::new(detector, config.inference, config.target_class);
        Self {
            adapter,
            config,
            notifier: Notifier::default(),
            cancel: CancelToken::default(),
            uploader: None,
        }
    }

    pub fn with_uploader(mut self, uploader: Box<dyn ArchiveUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the tiled, transform-driven pipeline on a raster file.
    ///
    /// GeoTIFF inputs use their embedded transform; anything else degrades to
    /// the identity transform (ground output in pixel coordinates).
    pub fn run_file(&self, path: &Path) -> Result<PipelineReport, PipelineError> {
        let source = RasterSource::open(path)?;
        self.notifier.publish(Milestone::UploadReceived);
        self.run_raster(source.image, source.transform)
    }

    /// Run the tiled pipeline on an already-decoded raster.
    pub fn run_raster(
        &self,
        raster: DynamicImage,
        transform: AffineTransform,
    ) -> Result<PipelineReport, PipelineError> {
        let tiles = tile_raster(&raster, &transform, self.config.tile_size)?;
        self.notifier.publish(Milestone::SlicingComplete);
        log::info!(
            "sliced {}x{} raster into {} tiles of {}px",
            raster.width(),
            raster.height(),
            tiles.len(),
            self.config.tile_size
        );

        let mut sink = ShapefileSink::new();
        let mut skipped = 0usize;
        for tile in &tiles {
            if self.cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let detections = self.adapter.detect_tile(tile)?;
            log::debug!(
                "tile ({}, {}): {} {} detections",
                tile.col_offset,
                tile.row_offset,
                detections.len(),
                self.config.target_class
            );
            self.save_annotated(tile, &detections)?;

            for det in &detections {
                match project_affine(&det.bbox, &det.transform) {
                    Ok(polygon) => {
                        sink.add_polygon(polygon);
                    }
                    Err(PipelineError::DegenerateBox { x1, y1, x2, y2 }) => {
                        log::warn!("skipping degenerate box ({x1}, {y1}, {x2}, {y2})");
                        skipped += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        self.notifier.publish(Milestone::DetectionComplete);

        self.finish(sink, tiles.len(), skipped)
    }

    /// Run the plain-image pipeline: no tiling, bilinear projection across
    /// the four user-supplied corner coordinates.
    pub fn run_plain_image(
        &self,
        path: &Path,
        corners: CornerCoords,
    ) -> Result<PipelineReport, PipelineError> {
        let image = image::open(path).map_err(|e| {
            PipelineError::InvalidRaster(format!("cannot open {}: {e}", path.display()))
        })?;
        if image.width() == 0 || image.height() == 0 {
            return Err(PipelineError::InvalidRaster(format!(
                "{} has zero width or height",
                path.display()
            )));
        }
        self.notifier.publish(Milestone::UploadReceived);

        let (width, height) = (image.width(), image.height());
        // The whole image is one tile; the identity transform is never used
        // for projection in this mode.
        let tile = RasterTile {
            image,
            col_offset: 0,
            row_offset: 0,
            transform: AffineTransform::identity(),
        };
        let detections = self.adapter.detect_tile(&tile)?;
        self.save_annotated(&tile, &detections)?;

        let mut sink = ShapefileSink::new();
        let mut skipped = 0usize;
        for det in &detections {
            match project_corners(&det.bbox, &corners, width, height) {
                Ok(polygon) => {
                    sink.add_polygon(polygon);
                }
                Err(PipelineError::DegenerateBox { x1, y1, x2, y2 }) => {
                    log::warn!("skipping degenerate box ({x1}, {y1}, {x2}, {y2})");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        self.notifier.publish(Milestone::DetectionComplete);

        self.finish(sink, 1, skipped)
    }

    fn save_annotated(
        &self,
        tile: &RasterTile,
        detections: &[crate::models::Detection],
    ) -> Result<(), PipelineError> {
        let Some(dir) = &self.config.annotated_dir else {
            return Ok(());
        };
        std::fs::create_dir_all(dir)
            .map_err(|e| PipelineError::Serialization(format!("creating {dir:?}: {e}")))?;
        let boxes: Vec<_> = detections.iter().map(|d| d.bbox).collect();
        let annotated = annotate::draw_boxes(&tile.image, &boxes);
        let path = dir.join(format!("tile_{}_{}.png", tile.row_offset, tile.col_offset));
        annotated
            .save(&path)
            .map_err(|e| PipelineError::Serialization(format!("saving {path:?}: {e}")))?;
        Ok(())
    }

    /// Serialize the sink into per-run temp storage, bundle the archive, and
    /// optionally upload it. The temp dir (and with it the raw shapefile
    /// triple) is removed when this returns, on success and on error alike.
    fn finish(
        &self,
        sink: ShapefileSink,
        tiles: usize,
        skipped: usize,
    ) -> Result<PipelineReport, PipelineError> {
        let work_dir = tempfile::tempdir()
            .map_err(|e| PipelineError::Serialization(format!("creating working dir: {e}")))?;
        let base = work_dir.path().join(&self.config.base_name);
        let features = sink.len();
        let paths = sink.serialize(&base)?;
        self.notifier.publish(Milestone::ShapefileGenerated);

        bundle_shapefile(&paths, &self.config.archive_path)?;
        log::info!(
            "wrote {} features to {:?}",
            features,
            self.config.archive_path
        );

        if let Some(uploader) = &self.uploader {
            if let Some(target) = &self.config.upload {
                match uploader.upload(&self.config.archive_path, &target.destination, &target.bucket)
                {
                    Ok(msg) => log::info!("archive uploaded: {msg}"),
                    Err(e) => {
                        // Non-fatal: the archive is still returned to the caller.
                        log::warn!("{}", PipelineError::Upload(e.to_string()));
                    }
                }
            }
        }

        Ok(PipelineReport {
            archive_path: self.config.archive_path.clone(),
            tiles,
            features,
            skipped,
        })
    }
}
