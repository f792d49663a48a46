use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, Rgb};
use tempfile::NamedTempFile;
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;
use weedmap::detect::{RawDetection, StubDetector};
use weedmap::{AffineTransform, CornerCoords, LonLat, PixelBox};

/// Index of the "weeds" class in the model's class set.
pub const WEEDS: usize = 2;

/// Creates a green test image of the given size and returns the temp file.
/// The file is cleaned up when the handle drops.
pub fn create_test_image(width: u32, height: u32) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    test_image(width, height)
        .save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// An in-memory green test raster.
pub fn test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |_, _| {
        Rgb([40u8, 160u8, 40u8])
    }))
}

/// Writes a small green RGB TIFF carrying the given double-valued directory
/// tags (pass none for a plain, untagged TIFF).
pub fn create_geotiff(width: u32, height: u32, tags: &[(Tag, Vec<f64>)]) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".tif")
        .tempfile()
        .expect("Failed to create temp tiff file");
    let mut encoder = TiffEncoder::new(file.reopen().expect("Failed to reopen temp tiff"))
        .expect("Failed to start tiff encoder");
    let mut image = encoder
        .new_image::<colortype::RGB8>(width, height)
        .expect("Failed to start tiff image");
    for (tag, values) in tags {
        image
            .encoder()
            .write_tag(*tag, values.as_slice())
            .expect("Failed to write tiff tag");
    }
    let data = test_image(width, height).to_rgb8().into_raw();
    image.write_data(&data).expect("Failed to write tiff data");
    file
}

pub fn raw_box(x1: f64, y1: f64, x2: f64, y2: f64, class_index: usize, conf: f32) -> RawDetection {
    RawDetection {
        bbox: PixelBox::new(x1, y1, x2, y2),
        class_index,
        confidence: conf,
    }
}

/// The survey transform from the orchard dataset: 0.001 degrees per pixel,
/// origin at (-48.886, -20.590), north-up.
pub fn survey_transform() -> AffineTransform {
    AffineTransform::new(0.001, 0.0, -48.886, 0.0, -0.001, -20.590).unwrap()
}

/// The four image corners of the orchard sample, as the operator would type
/// them in.
pub fn farm_corners() -> CornerCoords {
    CornerCoords {
        top_left: LonLat {
            lon: -48.8864783,
            lat: -20.5906375,
        },
        top_right: LonLat {
            lon: -48.8855653,
            lat: -20.5906264,
        },
        bottom_right: LonLat {
            lon: -48.8855534,
            lat: -20.5914861,
        },
        bottom_left: LonLat {
            lon: -48.8864664,
            lat: -20.5914973,
        },
    }
}

/// A detector that reports one weed box at the same spot in every tile.
pub fn one_weed_per_tile() -> Arc<StubDetector> {
    Arc::new(StubDetector::fixed(vec![raw_box(
        2.0, 2.0, 10.0, 10.0, WEEDS, 0.9,
    )]))
}

pub fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}
