//! Raster loading and tiling.

pub mod geotiff;
pub mod tiler;

pub use tiler::{RasterTile, TileRect, tile_grid, tile_raster};

use std::path::Path;

use image::DynamicImage;

use crate::error::PipelineError;
use crate::geo::affine::AffineTransform;

/// A decoded raster together with its pixel-to-ground transform.
///
/// For plain PNG/JPEG input the transform is the identity fallback and the
/// caller is expected to supply corner coordinates for projection instead.
#[derive(Debug)]
pub struct RasterSource {
    pub image: DynamicImage,
    pub transform: AffineTransform,
}

impl RasterSource {
    /// Open any raster the `image` crate can decode. GeoTIFF inputs also get
    /// their embedded affine transform read from the TIFF geotags; anything
    /// else (or a TIFF without geotags) falls back to the identity transform.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let image = image::open(path).map_err(|e| {
            PipelineError::InvalidRaster(format!("cannot open {}: {e}", path.display()))
        })?;
        if image.width() == 0 || image.height() == 0 {
            return Err(PipelineError::InvalidRaster(format!(
                "{} has zero width or height",
                path.display()
            )));
        }

        let is_tiff = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some(ext) if ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff")
        );
        let transform = if is_tiff {
            match geotiff::read_transform(path) {
                Ok(Some(t)) => t,
                Ok(None) => {
                    log::warn!(
                        "{} carries no georeference tags, falling back to pixel coordinates",
                        path.display()
                    );
                    AffineTransform::identity()
                }
                Err(e) => {
                    return Err(PipelineError::InvalidRaster(format!(
                        "cannot read geotags from {}: {e}",
                        path.display()
                    )));
                }
            }
        } else {
            AffineTransform::identity()
        };

        Ok(Self { image, transform })
    }
}
