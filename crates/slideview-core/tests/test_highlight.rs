use image::{DynamicImage, RgbImage, RgbaImage};

use slideview_core::config::HighlightConfig;
use slideview_core::highlight::HighlightGrid;
use slideview_core::io::tiling::TileLayout;
use slideview_core::viewport::ViewportRect;

fn grid_100() -> HighlightGrid {
    HighlightGrid::new(TileLayout::tiled(50, 50, 100, 100))
}

#[test]
fn test_grid_shape_from_layout() {
    let grid = HighlightGrid::new(TileLayout::tiled(256, 256, 1000, 513));
    assert_eq!(grid.shape(), (3, 4));
    assert_eq!(grid.count(), 0);
}

#[test]
fn test_untiled_grid_has_one_cell() {
    let mut grid = HighlightGrid::new(TileLayout::untiled(640, 480));
    assert_eq!(grid.shape(), (1, 1));
    assert_eq!(grid.tile_at(639.0, 479.0), Some((0, 0)));
    assert_eq!(grid.set_at_source(10.0, 10.0, None), Some((0, 0)));
    assert!(grid.is_highlighted(0, 0));
}

#[test]
fn test_toggle_twice_restores_state() {
    let mut grid = grid_100();
    assert_eq!(grid.set(1, 0, None), Some(true));
    assert_eq!(grid.set(1, 0, None), Some(false));
    assert!(grid.highlighted().is_empty());
}

#[test]
fn test_explicit_set_is_idempotent() {
    let mut grid = grid_100();
    grid.set(0, 1, Some(true));
    grid.set(0, 1, Some(true));
    assert_eq!(grid.highlighted(), vec![(0, 1)]);
    grid.set(0, 1, Some(false));
    assert_eq!(grid.count(), 0);
}

#[test]
fn test_out_of_range_is_ignored() {
    let mut grid = grid_100();
    assert_eq!(grid.set(2, 0, None), None);
    assert_eq!(grid.tile_at(100.0, 10.0), None);
    assert_eq!(grid.tile_at(-0.5, 10.0), None);
    assert_eq!(grid.set_at_source(10.0, 250.0, Some(true)), None);
    assert_eq!(grid.count(), 0);
}

#[test]
fn test_tile_at_boundaries() {
    let grid = grid_100();
    assert_eq!(grid.tile_at(49.9, 0.0), Some((0, 0)));
    assert_eq!(grid.tile_at(50.0, 0.0), Some((0, 1)));
    assert_eq!(grid.tile_at(0.0, 99.0), Some((1, 0)));
}

#[test]
fn test_highlighted_is_row_major() {
    let mut grid = HighlightGrid::new(TileLayout::tiled(10, 10, 30, 30));
    grid.set(2, 0, Some(true));
    grid.set(0, 2, Some(true));
    grid.set(1, 1, Some(true));
    assert_eq!(grid.highlighted(), vec![(0, 2), (1, 1), (2, 0)]);
    grid.clear();
    assert!(grid.highlighted().is_empty());
}

#[test]
fn test_overlay_fills_highlighted_tile() {
    let mut grid = grid_100();
    grid.set(0, 0, Some(true));
    let mut frame = DynamicImage::ImageRgb8(RgbImage::new(100, 100));
    let colors = HighlightConfig::default();

    grid.draw_overlay(&mut frame, &ViewportRect::full(100, 100), 1.0, &colors);
    let rgb = frame.to_rgb8();

    // Inside the highlighted tile: fill color blended over black.
    assert_eq!(rgb.get_pixel(10, 10).0, [100, 77, 0]);
    // Inside an untouched tile.
    assert_eq!(rgb.get_pixel(75, 75).0, [0, 0, 0]);
    // On a tile boundary: grid color blended over black.
    assert_eq!(rgb.get_pixel(50, 75).0, [90, 90, 90]);
}

#[test]
fn test_overlay_follows_viewport_and_scale() {
    let mut grid = grid_100();
    grid.set(1, 1, Some(true));
    // View the bottom-right quarter at 2 display pixels per source pixel.
    let mut frame = DynamicImage::ImageRgb8(RgbImage::new(100, 100));
    grid.draw_overlay(
        &mut frame,
        &ViewportRect::new(50, 50, 100, 100),
        0.5,
        &HighlightConfig::default(),
    );
    let rgb = frame.to_rgb8();
    assert_eq!(rgb.get_pixel(60, 60).0[0], 100);
    assert_eq!(rgb.get_pixel(99, 99).0[0], 100);
}

#[test]
fn test_overlay_on_rgba_frame() {
    let mut grid = grid_100();
    grid.set(0, 0, Some(true));
    let mut frame = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        100,
        100,
        image::Rgba([0, 0, 0, 255]),
    ));
    grid.draw_overlay(&mut frame, &ViewportRect::full(100, 100), 1.0, &HighlightConfig::default());
    let px = frame.to_rgba8().get_pixel(10, 10).0;
    assert_eq!(px, [100, 77, 0, 255]);
}

#[test]
fn test_overlay_without_highlights_draws_grid_only() {
    let grid = grid_100();
    let mut frame = DynamicImage::ImageRgb8(RgbImage::new(100, 100));
    grid.draw_overlay(&mut frame, &ViewportRect::full(100, 100), 1.0, &HighlightConfig::default());
    let rgb = frame.to_rgb8();
    assert_eq!(rgb.get_pixel(0, 20).0, [90, 90, 90]);
    assert_eq!(rgb.get_pixel(20, 20).0, [0, 0, 0]);
}
