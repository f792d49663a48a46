pub mod archive;
pub mod detect;
pub mod error;
pub mod geo;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod raster;
pub mod sink;
pub mod upload;

pub use error::PipelineError;
pub use geo::affine::AffineTransform;
pub use models::{CornerCoords, Detection, GroundPolygon, LonLat, PixelBox, SceneClass};
pub use notify::{Milestone, Notifier};
pub use pipeline::{CancelToken, PipelineConfig, PipelineReport, UploadTarget, WeedPipeline};
pub use sink::{ShapefilePaths, ShapefileSink};
