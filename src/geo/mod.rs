pub mod affine;
pub mod project;

pub use affine::AffineTransform;
pub use project::{project_affine, project_corners};
