//! Fixed-size tiling of a raster, preserving per-tile affine transforms.

use image::DynamicImage;

use crate::error::PipelineError;
use crate::geo::affine::AffineTransform;

/// Pixel-space placement of one tile within its parent raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub col_offset: u32,
    pub row_offset: u32,
    pub width: u32,
    pub height: u32,
}

/// One tile cut from a raster: the cropped pixels, the tile's pixel origin in
/// the parent, and the affine transform derived for that origin.
pub struct RasterTile {
    pub image: DynamicImage,
    pub col_offset: u32,
    pub row_offset: u32,
    pub transform: AffineTransform,
}

/// Compute the tile grid for a `width` x `height` raster cut into
/// `tile_size` x `tile_size` blocks, scanning row-major from (0, 0).
///
/// The last row and column are clipped to the remaining extent, never
/// padded, so the rectangles cover the raster exactly with no overlap.
/// Produces `ceil(height / tile_size) * ceil(width / tile_size)` rectangles.
pub fn tile_grid(width: u32, height: u32, tile_size: u32) -> Result<Vec<TileRect>, PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidRaster(format!(
            "zero-size raster ({width}x{height})"
        )));
    }
    if tile_size == 0 {
        return Err(PipelineError::InvalidRaster(
            "tile size must be non-zero".into(),
        ));
    }

    let mut rects = Vec::new();
    let mut row = 0;
    while row < height {
        let mut col = 0;
        while col < width {
            rects.push(TileRect {
                col_offset: col,
                row_offset: row,
                width: tile_size.min(width - col),
                height: tile_size.min(height - row),
            });
            col += tile_size;
        }
        row += tile_size;
    }
    Ok(rects)
}

/// Cut a raster into tiles, each tagged with its derived transform.
///
/// Eager by design: tile processing downstream is sequential and record ids
/// depend on this row-major visitation order.
pub fn tile_raster(
    raster: &DynamicImage,
    transform: &AffineTransform,
    tile_size: u32,
) -> Result<Vec<RasterTile>, PipelineError> {
    let rects = tile_grid(raster.width(), raster.height(), tile_size)?;
    let tiles = rects
        .into_iter()
        .map(|r| RasterTile {
            image: raster.crop_imm(r.col_offset, r.row_offset, r.width, r.height),
            col_offset: r.col_offset,
            row_offset: r.row_offset,
            transform: transform.for_tile(r.col_offset, r.row_offset),
        })
        .collect();
    Ok(tiles)
}
