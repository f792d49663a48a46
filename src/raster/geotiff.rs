//! GeoTIFF georeference extraction.
//!
//! Pixel data is decoded through the `image` crate like every other input;
//! this module only pulls the affine transform out of the TIFF geotags.
//! Two encodings are handled: a full ModelTransformation matrix, or the
//! common ModelPixelScale + ModelTiepoint pair of a north-up raster.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use tiff::decoder::Decoder;
use tiff::tags::Tag;

use crate::geo::affine::AffineTransform;

/// Read the embedded pixel-to-ground transform from a GeoTIFF, if present.
///
/// Returns `Ok(None)` when the file is a valid TIFF that simply carries no
/// georeference tags.
pub fn read_transform(path: &Path) -> Result<Option<AffineTransform>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .with_context(|| format!("decoding TIFF header of {}", path.display()))?;

    // A full transformation matrix takes precedence over scale + tiepoint.
    if let Ok(m) = decoder.get_tag_f64_vec(Tag::ModelTransformationTag) {
        if m.len() < 16 {
            anyhow::bail!("ModelTransformation tag has {} values, expected 16", m.len());
        }
        // Row-major 4x4; the affine part lives in rows 0 and 1.
        let t = AffineTransform::new(m[0], m[1], m[3], m[4], m[5], m[7])?;
        return Ok(Some(t));
    }

    let scale = match decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag) {
        Ok(s) => s,
        Err(_) => return Ok(None),
    };
    let tiepoint = match decoder.get_tag_f64_vec(Tag::ModelTiepointTag) {
        Ok(t) => t,
        Err(_) => return Ok(None),
    };
    if scale.len() < 2 || tiepoint.len() < 6 {
        anyhow::bail!(
            "malformed geotags: {} scale values, {} tiepoint values",
            scale.len(),
            tiepoint.len()
        );
    }

    // Tiepoint (i, j, _, x, y, _): raster pixel (i, j) maps to ground (x, y).
    // Ground y decreases as rows increase, hence the negated row scale.
    let (sx, sy) = (scale[0], scale[1]);
    let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
    let t = AffineTransform::new(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy)?;
    Ok(Some(t))
}
