use image::DynamicImage;

use crate::detect::{InferenceParams, RawDetection, WeedDetector};

type StubFn =
    dyn Fn(&DynamicImage, &InferenceParams) -> anyhow::Result<Vec<RawDetection>> + Send + Sync;

/// Deterministic detector used in tests and by builds without an inference
/// backend. Returns whatever the configured function produces, with no model
/// involved.
pub struct StubDetector {
    f: Box<StubFn>,
}

impl StubDetector {
    /// A stub that returns the same detections for every tile.
    pub fn fixed(detections: Vec<RawDetection>) -> Self {
        Self {
            f: Box::new(move |_, _| Ok(detections.clone())),
        }
    }

    /// A stub that never detects anything.
    pub fn empty() -> Self {
        Self::fixed(Vec::new())
    }

    /// A stub driven by a function of the tile image, for tests that need
    /// per-tile behavior or injected failures.
    pub fn with_fn<F>(f: F) -> Self
    where
        F: Fn(&DynamicImage, &InferenceParams) -> anyhow::Result<Vec<RawDetection>>
            + Send
            + Sync
            + 'static,
    {
        Self { f: Box::new(f) }
    }
}

impl WeedDetector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(
        &self,
        image: &DynamicImage,
        params: &InferenceParams,
    ) -> anyhow::Result<Vec<RawDetection>> {
        (self.f)(image, params)
    }
}
