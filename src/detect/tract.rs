#![cfg(feature = "backend-tract")]

//! Tract-based ONNX backend for YOLO-family detection models.

use std::path::Path;

use anyhow::{Context, Result};
use image::DynamicImage;
use image::imageops::FilterType;
use tract_onnx::prelude::*;

use crate::detect::{InferenceParams, RawDetection, WeedDetector};
use crate::models::PixelBox;

/// ONNX inference backend. Loads a local model file once and runs it on RGB
/// tile images resized to the model's fixed input size.
pub struct TractDetector {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    input_size: u32,
}

impl TractDetector {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_size as usize, input_size as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self { model, input_size })
    }

    fn build_input(&self, image: &DynamicImage) -> Tensor {
        let size = self.input_size;
        let resized = image
            .resize_exact(size, size, FilterType::Triangle)
            .to_rgb8();
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, size as usize, size as usize),
            |(_, channel, y, x)| resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
        );
        input.into_tensor()
    }
}

impl WeedDetector for TractDetector {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(
        &self,
        image: &DynamicImage,
        params: &InferenceParams,
    ) -> Result<Vec<RawDetection>> {
        let input = self.build_input(image);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("model inference failed")?;
        let output = outputs
            .first()
            .context("model produced no outputs")?
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        // YOLOv8 layout: [1, 4 + num_classes, num_anchors] with cx/cy/w/h in
        // the first four rows and per-class scores after.
        let shape = output.shape();
        anyhow::ensure!(
            shape.len() == 3 && shape[0] == 1 && shape[1] > 4,
            "unexpected model output shape {shape:?}"
        );
        let num_classes = shape[1] - 4;
        let num_anchors = shape[2];

        // Boxes come back in model-input coordinates; scale to the tile.
        let scale_x = image.width() as f64 / self.input_size as f64;
        let scale_y = image.height() as f64 / self.input_size as f64;

        let mut candidates = Vec::new();
        for anchor in 0..num_anchors {
            let mut best_score = 0.0f32;
            let mut best_class = 0usize;
            for class in 0..num_classes {
                let score = output[[0, 4 + class, anchor]];
                if score > best_score {
                    best_score = score;
                    best_class = class;
                }
            }
            if best_score < params.confidence {
                continue;
            }

            let cx = output[[0, 0, anchor]] as f64;
            let cy = output[[0, 1, anchor]] as f64;
            let w = output[[0, 2, anchor]] as f64;
            let h = output[[0, 3, anchor]] as f64;
            candidates.push(RawDetection {
                bbox: PixelBox::new(
                    (cx - w / 2.0) * scale_x,
                    (cy - h / 2.0) * scale_y,
                    (cx + w / 2.0) * scale_x,
                    (cy + h / 2.0) * scale_y,
                ),
                class_index: best_class,
                confidence: best_score,
            });
        }

        Ok(non_max_suppression(candidates, params.iou))
    }
}

fn intersection_over_union(a: &PixelBox, b: &PixelBox) -> f64 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let intersection = ix * iy;
    let union = a.width() * a.height() + b.width() * b.height() - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Greedy per-class NMS: keep the highest-confidence box, drop same-class
/// boxes overlapping it beyond the IoU threshold, repeat.
fn non_max_suppression(mut detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::new();
    for det in detections {
        let overlaps = kept.iter().any(|k| {
            k.class_index == det.class_index
                && intersection_over_union(&k.bbox, &det.bbox) > iou_threshold as f64
        });
        if !overlaps {
            kept.push(det);
        }
    }
    kept
}
