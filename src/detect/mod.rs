//! Detection model boundary.
//!
//! The model itself is opaque: one call per tile image, returning raw boxes
//! with class indices and confidences. Backends implement [`WeedDetector`];
//! the [`DetectionAdapter`] normalizes their output, filters to the target
//! class, and attaches the tile's affine transform.

pub mod annotate;
mod stub;
#[cfg(feature = "backend-tract")]
mod tract;

pub use stub::StubDetector;
#[cfg(feature = "backend-tract")]
pub use tract::TractDetector;

use std::sync::Arc;

use image::DynamicImage;

use crate::error::PipelineError;
use crate::models::{Detection, PixelBox, SceneClass};
use crate::raster::RasterTile;

/// Inference parameters passed to the model on every call.
///
/// The defaults (inference size 640, confidence 0.2, IoU 0.4) materially
/// change recall/precision and must stay reproducible across runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceParams {
    pub image_size: u32,
    pub confidence: f32,
    pub iou: f32,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            image_size: 640,
            confidence: 0.2,
            iou: 0.4,
        }
    }
}

/// Raw model output for one box, in pixel coordinates of the tile image.
#[derive(Debug, Clone, Copy)]
pub struct RawDetection {
    pub bbox: PixelBox,
    pub class_index: usize,
    pub confidence: f32,
}

/// A detection backend.
///
/// Implementations run inference on one tile image and return every box the
/// model produced; class filtering happens in the adapter. Backends must be
/// shareable across a long-lived process (one model loaded at startup).
pub trait WeedDetector: Send + Sync {
    /// Backend identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Run detection on a single tile image.
    fn detect(
        &self,
        image: &DynamicImage,
        params: &InferenceParams,
    ) -> anyhow::Result<Vec<RawDetection>>;
}

/// Normalizes backend output into [`Detection`] records for one tile.
pub struct DetectionAdapter {
    detector: Arc<dyn WeedDetector>,
    params: InferenceParams,
    target: SceneClass,
}

impl DetectionAdapter {
    pub fn new(detector: Arc<dyn WeedDetector>, params: InferenceParams, target: SceneClass) -> Self {
        Self {
            detector,
            params,
            target,
        }
    }

    pub fn params(&self) -> &InferenceParams {
        &self.params
    }

    /// Detect the target class in one tile.
    ///
    /// Boxes are clamped to the tile's true bounds and tagged with the tile's
    /// transform, never the parent raster's. A failed model call is fatal for
    /// the run; unknown class indices are skipped with a warning.
    pub fn detect_tile(&self, tile: &RasterTile) -> Result<Vec<Detection>, PipelineError> {
        let raw = self
            .detector
            .detect(&tile.image, &self.params)
            .map_err(|e| PipelineError::ModelInvocation(format!("{}: {e}", self.detector.name())))?;

        let mut detections = Vec::new();
        for r in raw {
            let Some(class) = SceneClass::from_index(r.class_index) else {
                log::warn!("skipping detection with unknown class index {}", r.class_index);
                continue;
            };
            if class != self.target {
                log::debug!("ignoring {class} detection (target is {})", self.target);
                continue;
            }
            detections.push(Detection {
                class,
                confidence: r.confidence,
                bbox: r.bbox.clamp_to(tile.image.width(), tile.image.height()),
                transform: tile.transform,
            });
        }
        Ok(detections)
    }
}
