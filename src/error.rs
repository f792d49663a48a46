/// Errors produced by the detection pipeline.
///
/// The variants mirror the stages of a run: opening the raster, invoking the
/// model, projecting boxes, writing the vector output, uploading the archive.
/// `DegenerateBox` is recoverable (the offending detection is skipped);
/// everything else aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The source raster could not be opened or has zero width/height.
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    /// A detection box has zero area or projects to non-finite coordinates.
    #[error("degenerate box ({x1}, {y1}, {x2}, {y2})")]
    DegenerateBox { x1: f64, y1: f64, x2: f64, y2: f64 },

    /// The external detection model call failed. Fatal for the run.
    #[error("model invocation failed: {0}")]
    ModelInvocation(String),

    /// Writing the shapefile triple or the archive failed. Fatal for the run.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Remote storage upload failed. Non-fatal; the archive is still
    /// returned to the caller.
    #[error("upload failed: {0}")]
    Upload(String),

    /// The run was cancelled between tile iterations.
    #[error("pipeline run cancelled")]
    Cancelled,
}
