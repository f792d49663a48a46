//! Pixel-box to ground-polygon projection.
//!
//! Two strategies, chosen by input mode and never mixed within a run:
//! an affine apply for georeferenced rasters (per-tile transforms), and an
//! independent bilinear lon/lat blend for plain images with four supplied
//! corner coordinates. The bilinear blend is an approximation valid for
//! small, near-rectangular footprints, not a projective transform.

use crate::error::PipelineError;
use crate::geo::affine::AffineTransform;
use crate::models::{CornerCoords, GroundPolygon, PixelBox};

fn check_box(bbox: &PixelBox) -> Result<(), PipelineError> {
    if bbox.is_degenerate() {
        return Err(PipelineError::DegenerateBox {
            x1: bbox.x1,
            y1: bbox.y1,
            x2: bbox.x2,
            y2: bbox.y2,
        });
    }
    Ok(())
}

fn check_finite(bbox: &PixelBox, ring: &GroundPolygon) -> Result<(), PipelineError> {
    let finite = ring
        .ring()
        .iter()
        .all(|(x, y)| x.is_finite() && y.is_finite());
    if finite {
        Ok(())
    } else {
        Err(PipelineError::DegenerateBox {
            x1: bbox.x1,
            y1: bbox.y1,
            x2: bbox.x2,
            y2: bbox.y2,
        })
    }
}

/// Project a pixel box through the affine transform of the tile it was
/// detected in, producing the closed clockwise ring [tl, tr, br, bl, tl].
pub fn project_affine(
    bbox: &PixelBox,
    transform: &AffineTransform,
) -> Result<GroundPolygon, PipelineError> {
    check_box(bbox)?;

    let top_left = transform.apply(bbox.x1, bbox.y1);
    let top_right = transform.apply(bbox.x2, bbox.y1);
    let bottom_left = transform.apply(bbox.x1, bbox.y2);
    let bottom_right = transform.apply(bbox.x2, bbox.y2);

    let polygon = GroundPolygon::from_corners(top_left, top_right, bottom_right, bottom_left);
    check_finite(bbox, &polygon)?;
    Ok(polygon)
}

/// Interpolate the lon/lat of a single pixel across the quadrilateral defined
/// by the image's four corner coordinates.
///
/// Longitude blends along the top and bottom edges by the horizontal
/// fraction, then between those by the vertical fraction; latitude blends
/// along the left and right edges by the vertical fraction, then between
/// those by the horizontal fraction.
pub fn interpolate_lonlat(
    x: f64,
    y: f64,
    img_width: f64,
    img_height: f64,
    corners: &CornerCoords,
) -> (f64, f64) {
    let fx = x / img_width;
    let fy = y / img_height;

    let tl = corners.top_left;
    let tr = corners.top_right;
    let br = corners.bottom_right;
    let bl = corners.bottom_left;

    let lon_top = tl.lon + (tr.lon - tl.lon) * fx;
    let lon_bottom = bl.lon + (br.lon - bl.lon) * fx;
    let lon = lon_top + (lon_bottom - lon_top) * fy;

    let lat_left = tl.lat + (bl.lat - tl.lat) * fy;
    let lat_right = tr.lat + (br.lat - tr.lat) * fy;
    let lat = lat_left + (lat_right - lat_left) * fx;

    (lon, lat)
}

/// Project a pixel box from a plain (non-georeferenced) image using the four
/// user-supplied corner coordinates of the whole image.
pub fn project_corners(
    bbox: &PixelBox,
    corners: &CornerCoords,
    img_width: u32,
    img_height: u32,
) -> Result<GroundPolygon, PipelineError> {
    check_box(bbox)?;

    let w = img_width as f64;
    let h = img_height as f64;
    let top_left = interpolate_lonlat(bbox.x1, bbox.y1, w, h, corners);
    let top_right = interpolate_lonlat(bbox.x2, bbox.y1, w, h, corners);
    let bottom_left = interpolate_lonlat(bbox.x1, bbox.y2, w, h, corners);
    let bottom_right = interpolate_lonlat(bbox.x2, bbox.y2, w, h, corners);

    let polygon = GroundPolygon::from_corners(top_left, top_right, bottom_right, bottom_left);
    check_finite(bbox, &polygon)?;
    Ok(polygon)
}
