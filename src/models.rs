use std::fmt;
use std::str::FromStr;

use crate::geo::affine::AffineTransform;

/// Classes the detection model was trained on, in model index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneClass {
    CitrusArea,
    Trees,
    Weeds,
    WeedsAndTrees,
}

impl SceneClass {
    pub const ALL: [SceneClass; 4] = [
        SceneClass::CitrusArea,
        SceneClass::Trees,
        SceneClass::Weeds,
        SceneClass::WeedsAndTrees,
    ];

    /// Map a raw model class index to a known class.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(0)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SceneClass::CitrusArea => "citrus area",
            SceneClass::Trees => "trees",
            SceneClass::Weeds => "weeds",
            SceneClass::WeedsAndTrees => "weeds and trees",
        }
    }
}

impl fmt::Display for SceneClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Axis-aligned bounding box in pixel coordinates, with x1 <= x2 and y1 <= y2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl PixelBox {
    /// Build a box from two corner points, normalizing the corner order.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// A box with no width or height cannot be projected to a polygon.
    pub fn is_degenerate(&self) -> bool {
        self.x1 == self.x2 || self.y1 == self.y2
    }

    /// Clamp the box to the bounds of a `width` x `height` image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        Self {
            x1: self.x1.clamp(0.0, width as f64),
            y1: self.y1.clamp(0.0, height as f64),
            x2: self.x2.clamp(0.0, width as f64),
            y2: self.y2.clamp(0.0, height as f64),
        }
    }
}

/// One detection from the model, tied to the transform of the tile it was
/// found in. Pixel coordinates are relative to that tile, never the parent
/// raster.
#[derive(Debug, Clone)]
pub struct Detection {
    pub class: SceneClass,
    pub confidence: f32,
    pub bbox: PixelBox,
    pub transform: AffineTransform,
}

/// A closed ring of ground coordinates: four corners plus the repeated first
/// point, clockwise starting at the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundPolygon {
    ring: Vec<(f64, f64)>,
}

impl GroundPolygon {
    /// Build the closed ring [tl, tr, br, bl, tl]. The vertex order is part
    /// of the contract: GIS consumers assume consistent ring winding.
    pub fn from_corners(
        top_left: (f64, f64),
        top_right: (f64, f64),
        bottom_right: (f64, f64),
        bottom_left: (f64, f64),
    ) -> Self {
        Self {
            ring: vec![top_left, top_right, bottom_right, bottom_left, top_left],
        }
    }

    pub fn ring(&self) -> &[(f64, f64)] {
        &self.ring
    }

    pub fn is_closed(&self) -> bool {
        self.ring.len() >= 4 && self.ring.first() == self.ring.last()
    }
}

/// A longitude/latitude pair, parsed from "lon, lat" text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl FromStr for LonLat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let lon = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing longitude in {s:?}"))?
            .parse::<f64>()?;
        let lat = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing latitude in {s:?}"))?
            .parse::<f64>()?;
        if parts.next().is_some() {
            anyhow::bail!("expected \"lon, lat\", got {s:?}");
        }
        Ok(Self { lon, lat })
    }
}

/// The four lon/lat corners of a plain (non-georeferenced) image, used for
/// bilinear projection when no embedded transform is available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerCoords {
    pub top_left: LonLat,
    pub top_right: LonLat,
    pub bottom_right: LonLat,
    pub bottom_left: LonLat,
}
