use std::path::Path;

use image::{DynamicImage, Rgba, RgbaImage};

use slideview_core::error::ViewerError;
use slideview_core::io::export::{
    export_tiles_csv, import_tiles_csv, parse_tiles_csv, save_crop, save_image, CropRect,
};
use slideview_core::source::SourceImage;

mod common;

#[test]
fn test_save_image_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let img = common::gradient_image(4, 4);

    let err = save_image(&img, &dir.path().join("crop.bmpx")).unwrap_err();
    assert!(matches!(err, ViewerError::Export { .. }));
    assert!(save_image(&img, &dir.path().join("crop")).is_err());
}

#[test]
fn test_save_jpeg_drops_alpha() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crop.JPG");
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 200, 30, 128])));

    save_image(&img, &path).unwrap();
    let loaded = image::open(&path).unwrap();
    assert_eq!((loaded.width(), loaded.height()), (8, 8));
    assert!(!loaded.color().has_alpha());
}

#[test]
fn test_save_crop_rejects_out_of_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let source = common::gradient_source(20, 10);
    let crop = CropRect { x: 15, y: 0, width: 10, height: 5 };
    assert!(save_crop(&source, &crop, &dir.path().join("c.png")).is_err());

    let empty = CropRect { x: 0, y: 0, width: 0, height: 5 };
    assert!(matches!(
        save_crop(&source, &empty, &dir.path().join("c.png")),
        Err(ViewerError::InvalidDimensions { .. })
    ));
}

#[test]
fn test_save_crop_keeps_alpha_in_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alpha.png");
    let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 6, Rgba([1, 2, 3, 4])));
    let source = SourceImage::from_dynamic("alpha.png".into(), rgba).unwrap();

    save_crop(&source, &CropRect { x: 2, y: 2, width: 3, height: 3 }, &path).unwrap();
    let loaded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(loaded.dimensions(), (3, 3));
    assert_eq!(loaded.get_pixel(0, 0).0, [1, 2, 3, 4]);
}

#[test]
fn test_tiles_csv_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiles.csv");
    let tiles = vec![(0, 0), (3, 17), (42, 1)];

    export_tiles_csv(&tiles, &path).unwrap();
    assert_eq!(import_tiles_csv(&path).unwrap(), tiles);
}

#[test]
fn test_parse_tiles_csv_tolerates_whitespace() {
    let tiles = parse_tiles_csv(" 1 , 2 \r\n\n3,4", Path::new("t.csv")).unwrap();
    assert_eq!(tiles, vec![(1, 2), (3, 4)]);
}

#[test]
fn test_parse_tiles_csv_rejects_negative() {
    assert!(parse_tiles_csv("-1,2\n", Path::new("t.csv")).is_err());
    assert!(parse_tiles_csv("1;2\n", Path::new("t.csv")).is_err());
}

#[test]
fn test_export_tiles_to_missing_dir_fails() {
    let err = export_tiles_csv(&[(0, 0)], Path::new("/nonexistent/dir/tiles.csv")).unwrap_err();
    assert!(matches!(err, ViewerError::Export { .. }));
}
