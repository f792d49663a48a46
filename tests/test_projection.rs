mod common;
use common::*;

use weedmap::geo::project::{interpolate_lonlat, project_affine, project_corners};
use weedmap::{AffineTransform, PipelineError, PixelBox};

#[test]
fn affine_apply_follows_six_coefficient_formula() {
    let t = AffineTransform::new(2.0, 0.5, 10.0, -0.25, 3.0, -7.0).unwrap();
    let (x, y) = t.apply(4.0, 2.0);
    assert_close(x, 2.0 * 4.0 + 0.5 * 2.0 + 10.0);
    assert_close(y, -0.25 * 4.0 + 3.0 * 2.0 - 7.0);
}

#[test]
fn non_finite_coefficients_are_rejected() {
    assert!(AffineTransform::new(f64::NAN, 0.0, 0.0, 0.0, 1.0, 0.0).is_err());
    assert!(AffineTransform::new(1.0, 0.0, f64::INFINITY, 0.0, 1.0, 0.0).is_err());
}

#[test]
fn tile_transform_translates_the_parent() {
    // tile.apply(col, row) == parent.apply(col + col_off, row + row_off),
    // including for transforms with shear.
    let parent = AffineTransform::new(0.001, 0.0002, -48.886, -0.0001, -0.001, -20.590).unwrap();
    let tile = parent.for_tile(3000, 1000);

    for (col, row) in [(0.0, 0.0), (10.0, 10.0), (123.5, 7.25), (2999.0, 999.0)] {
        let (tx, ty) = tile.apply(col, row);
        let (px, py) = parent.apply(col + 3000.0, row + 1000.0);
        assert_close(tx, px);
        assert_close(ty, py);
    }
}

#[test]
fn whole_raster_tile_transform_is_unchanged() {
    let parent = survey_transform();
    assert_eq!(parent.for_tile(0, 0), parent);
}

#[test]
fn projects_orchard_detection_to_known_ground_point() {
    // Tile at (col 3000, row 0) of the 6000x4000 survey, detection box
    // (10, 10, 50, 50), tile transform as recorded in the dataset.
    let tile_transform = AffineTransform::new(0.001, 0.0, -48.886, 0.0, -0.001, -20.590).unwrap();
    let bbox = PixelBox::new(10.0, 10.0, 50.0, 50.0);
    let polygon = project_affine(&bbox, &tile_transform).unwrap();

    let ring = polygon.ring();
    assert_eq!(ring.len(), 5);
    // Top-left ground point.
    assert_close(ring[0].0, -48.886 + 0.001 * 10.0);
    assert_close(ring[0].1, -20.590 - 0.001 * 10.0);
}

#[test]
fn ring_is_closed_and_clockwise_from_top_left() {
    let t = survey_transform();
    let bbox = PixelBox::new(0.0, 0.0, 100.0, 200.0);
    let polygon = project_affine(&bbox, &t).unwrap();
    let ring = polygon.ring();

    assert!(polygon.is_closed());
    assert_eq!(ring[0], ring[4]);
    assert_eq!(ring[0], t.apply(0.0, 0.0));
    assert_eq!(ring[1], t.apply(100.0, 0.0));
    assert_eq!(ring[2], t.apply(100.0, 200.0));
    assert_eq!(ring[3], t.apply(0.0, 200.0));
}

#[test]
fn degenerate_boxes_are_rejected_in_both_modes() {
    let zero_width = PixelBox::new(5.0, 1.0, 5.0, 9.0);
    let zero_height = PixelBox::new(1.0, 5.0, 9.0, 5.0);

    for bbox in [zero_width, zero_height] {
        assert!(matches!(
            project_affine(&bbox, &survey_transform()),
            Err(PipelineError::DegenerateBox { .. })
        ));
        assert!(matches!(
            project_corners(&bbox, &farm_corners(), 100, 100),
            Err(PipelineError::DegenerateBox { .. })
        ));
    }
}

#[test]
fn interpolation_pins_the_image_corners() {
    let corners = farm_corners();
    let (lon, lat) = interpolate_lonlat(0.0, 0.0, 640.0, 480.0, &corners);
    assert_close(lon, corners.top_left.lon);
    assert_close(lat, corners.top_left.lat);

    let (lon, lat) = interpolate_lonlat(640.0, 480.0, 640.0, 480.0, &corners);
    assert_close(lon, corners.bottom_right.lon);
    assert_close(lat, corners.bottom_right.lat);
}

#[test]
fn image_center_interpolates_to_corner_average() {
    let corners = farm_corners();
    let (lon, lat) = interpolate_lonlat(320.0, 240.0, 640.0, 480.0, &corners);

    let avg_lon = (corners.top_left.lon
        + corners.top_right.lon
        + corners.bottom_right.lon
        + corners.bottom_left.lon)
        / 4.0;
    let avg_lat = (corners.top_left.lat
        + corners.top_right.lat
        + corners.bottom_right.lat
        + corners.bottom_left.lat)
        / 4.0;
    assert_close(lon, avg_lon);
    assert_close(lat, avg_lat);
}

#[test]
fn corner_projection_builds_closed_ring_in_vertex_order() {
    let corners = farm_corners();
    let bbox = PixelBox::new(100.0, 50.0, 400.0, 350.0);
    let polygon = project_corners(&bbox, &corners, 640, 480).unwrap();
    let ring = polygon.ring();

    assert!(polygon.is_closed());
    assert_eq!(
        ring[0],
        interpolate_lonlat(100.0, 50.0, 640.0, 480.0, &corners)
    );
    assert_eq!(
        ring[1],
        interpolate_lonlat(400.0, 50.0, 640.0, 480.0, &corners)
    );
    assert_eq!(
        ring[2],
        interpolate_lonlat(400.0, 350.0, 640.0, 480.0, &corners)
    );
    assert_eq!(
        ring[3],
        interpolate_lonlat(100.0, 350.0, 640.0, 480.0, &corners)
    );
}
