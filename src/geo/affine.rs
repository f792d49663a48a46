use anyhow::Result;

/// Mapping between pixel coordinates and ground coordinates for a raster or
/// sub-raster.
///
/// Six coefficients (a, b, c, d, e, f) map pixel (col, row) to ground (x, y):
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// For a north-up raster, `a` is the pixel width, `e` the (negative) pixel
/// height, and (c, f) the ground position of the top-left pixel corner.
/// Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl AffineTransform {
    /// Build a transform from the six raw coefficients. Non-finite values
    /// are rejected.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<Self> {
        for (name, v) in [("a", a), ("b", b), ("c", c), ("d", d), ("e", e), ("f", f)] {
            if !v.is_finite() {
                anyhow::bail!("affine coefficient {name} is not finite: {v}");
            }
        }
        Ok(Self { a, b, c, d, e, f })
    }

    /// The identity mapping: ground coordinates equal pixel coordinates.
    /// Used for rasters that carry no georeference information.
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 1.0,
            f: 0.0,
        }
    }

    /// Whether this is the identity fallback rather than a real georeference.
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    pub fn coefficients(&self) -> (f64, f64, f64, f64, f64, f64) {
        (self.a, self.b, self.c, self.d, self.e, self.f)
    }

    /// Map a pixel position to ground coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Derive the transform of a tile whose pixel (0, 0) sits at
    /// (`col_offset`, `row_offset`) in the parent raster.
    ///
    /// Scale and shear are unchanged; only the translation moves, so that
    /// `tile.apply(col, row) == parent.apply(col + col_offset, row + row_offset)`
    /// for every pixel.
    pub fn for_tile(&self, col_offset: u32, row_offset: u32) -> Self {
        let (c, f) = self.apply(col_offset as f64, row_offset as f64);
        Self { c, f, ..*self }
    }
}
