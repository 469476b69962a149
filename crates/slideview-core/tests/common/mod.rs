#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};

use slideview_core::config::{PyramidConfig, ViewerConfig};
use slideview_core::error::{Result, ViewerError};
use slideview_core::io::tiling::{TileLayout, TileLayoutReader};
use slideview_core::session::ViewerSession;
use slideview_core::source::SourceImage;

/// RGB image whose red channel follows x and green channel follows y.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn gradient_source(width: u32, height: u32) -> SourceImage {
    SourceImage::from_dynamic(PathBuf::from("synthetic.png"), gradient_image(width, height))
        .expect("synthetic source")
}

/// Write a gradient PNG into `dir` and return its path.
pub fn write_gradient_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    gradient_image(width, height)
        .save(&path)
        .expect("write PNG");
    path
}

/// Config with a small level threshold so tiny test images still get a
/// second pyramid level.
pub fn small_config() -> ViewerConfig {
    ViewerConfig {
        pyramid: PyramidConfig {
            downsample_factor: 4,
            min_level_size: 16,
        },
        ..Default::default()
    }
}

/// Tile reader that always reports the same layout.
pub struct FixedTileReader(pub TileLayout);

impl TileLayoutReader for FixedTileReader {
    fn read_layout(&self, _path: &Path) -> Result<TileLayout> {
        Ok(self.0)
    }
}

/// Tile reader that always fails.
pub struct FailingTileReader;

impl TileLayoutReader for FailingTileReader {
    fn read_layout(&self, path: &Path) -> Result<TileLayout> {
        Err(ViewerError::InvalidState(format!(
            "no tiling metadata for {}",
            path.display()
        )))
    }
}

pub fn tiled_session(tile: u32, width: u32, height: u32) -> ViewerSession {
    ViewerSession::with_tile_reader(
        small_config(),
        Box::new(FixedTileReader(TileLayout::tiled(tile, tile, width, height))),
    )
}
