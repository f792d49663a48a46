//! Annotated tile images with detection boxes overlaid.
//!
//! Cosmetic side channel: the vector output never depends on these images.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::models::PixelBox;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const BOX_THICKNESS: i32 = 3;

/// Draw hollow rectangles for each detection box onto a copy of the tile.
pub fn draw_boxes(image: &DynamicImage, boxes: &[PixelBox]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    for b in boxes {
        // Nested 1px rectangles give the box its thickness.
        for inset in 0..BOX_THICKNESS {
            let w = b.width() as i32 - 2 * inset;
            let h = b.height() as i32 - 2 * inset;
            if w < 1 || h < 1 {
                break;
            }
            let rect = Rect::at(b.x1 as i32 + inset, b.y1 as i32 + inset)
                .of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
        }
    }
    canvas
}
