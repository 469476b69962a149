//! Native tiling metadata, read lazily when highlighting is first enabled.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::ImageFormat;
use tiff::decoder::Decoder;
use tiff::tags::Tag;

use crate::error::Result;

/// Tile geometry of the first page of a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileLayout {
    pub tiled: bool,
    pub tile_width: u32,
    pub tile_height: u32,
    pub image_width: u32,
    pub image_height: u32,
}

impl TileLayout {
    pub fn tiled(tile_width: u32, tile_height: u32, image_width: u32, image_height: u32) -> Self {
        Self {
            tiled: true,
            tile_width: tile_width.max(1),
            tile_height: tile_height.max(1),
            image_width,
            image_height,
        }
    }

    /// A single tile covering the whole image.
    pub fn untiled(image_width: u32, image_height: u32) -> Self {
        Self {
            tiled: false,
            tile_width: image_width.max(1),
            tile_height: image_height.max(1),
            image_width,
            image_height,
        }
    }

    /// `(rows, cols)` of the tile grid.
    pub fn grid_shape(&self) -> (usize, usize) {
        if !self.tiled {
            return (1, 1);
        }
        let rows = self.image_height.div_ceil(self.tile_height).max(1);
        let cols = self.image_width.div_ceil(self.tile_width).max(1);
        (rows as usize, cols as usize)
    }
}

/// Source of tiling metadata for an opened file.
pub trait TileLayoutReader {
    fn read_layout(&self, path: &Path) -> Result<TileLayout>;
}

/// Reads TIFF tile tags; every other format is reported as untiled.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileTileReader;

impl TileLayoutReader for FileTileReader {
    fn read_layout(&self, path: &Path) -> Result<TileLayout> {
        read_tile_layout(path)
    }
}

pub fn read_tile_layout(path: &Path) -> Result<TileLayout> {
    match ImageFormat::from_path(path) {
        Ok(ImageFormat::Tiff) => read_tiff_layout(path),
        _ => {
            let (width, height) = image::image_dimensions(path)?;
            Ok(TileLayout::untiled(width, height))
        }
    }
}

fn read_tiff_layout(path: &Path) -> Result<TileLayout> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    let (width, height) = decoder.dimensions()?;
    let tile_width = decoder.find_tag_unsigned::<u32>(Tag::TileWidth)?;
    let tile_height = decoder.find_tag_unsigned::<u32>(Tag::TileLength)?;

    Ok(match (tile_width, tile_height) {
        (Some(tw), Some(th)) if tw > 0 && th > 0 => TileLayout::tiled(tw, th, width, height),
        _ => TileLayout::untiled(width, height),
    })
}
