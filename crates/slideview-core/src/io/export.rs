//! Crop export and highlighted-tile coordinate files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use tracing::info;

use crate::error::{Result, ViewerError};
use crate::geometry::{round_px, DisplayRect, DisplaySize};
use crate::source::{extract_region, SourceImage};
use crate::viewport::ViewportRect;

/// A rectangle in level-0 pixel coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Map a display-space selection onto the viewport by its fractional
    /// position within the display area.
    ///
    /// Returns `None` for an empty display or a selection with no area
    /// inside the display.
    pub fn from_selection(
        selection: DisplayRect,
        display: DisplaySize,
        viewport: &ViewportRect,
    ) -> Option<Self> {
        if display.is_empty() {
            return None;
        }
        let sel = selection.normalized();
        let fx = |x: f64| (x / display.width as f64).clamp(0.0, 1.0);
        let fy = |y: f64| (y / display.height as f64).clamp(0.0, 1.0);

        let vw = viewport.width() as f64;
        let vh = viewport.height() as f64;
        let x0 = round_px(viewport.left as f64 + fx(sel.x1) * vw);
        let x1 = round_px(viewport.left as f64 + fx(sel.x2) * vw);
        let y0 = round_px(viewport.top as f64 + fy(sel.y1) * vh);
        let y1 = round_px(viewport.top as f64 + fy(sel.y2) * vh);

        if x1 <= x0 || y1 <= y0 || x0 < 0 || y0 < 0 {
            return None;
        }
        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    /// Check that the rect is non-empty and lies inside `src_w`x`src_h`.
    pub fn validated(&self, src_w: u32, src_h: u32) -> Result<CropRect> {
        if self.width == 0 || self.height == 0 {
            return Err(ViewerError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.x as u64 + self.width as u64 > src_w as u64
            || self.y as u64 + self.height as u64 > src_h as u64
        {
            return Err(ViewerError::InvalidState(format!(
                "Crop region ({},{} {}x{}) exceeds source dimensions ({src_w}x{src_h})",
                self.x, self.y, self.width, self.height
            )));
        }
        Ok(self.clone())
    }
}

/// Write the full-resolution pixels under `crop` to `path`.
pub fn save_crop(source: &SourceImage, crop: &CropRect, path: &Path) -> Result<()> {
    let crop = crop.validated(source.width(), source.height())?;
    let region = extract_region(source.image(), crop.x, crop.y, crop.width, crop.height);
    save_image(&region, path)?;
    info!(
        path = %path.display(),
        x = crop.x,
        y = crop.y,
        width = crop.width,
        height = crop.height,
        "Crop exported"
    );
    Ok(())
}

/// Save an image, choosing the format from the file extension (`png`,
/// `tif`/`tiff`, `jpg`/`jpeg`).
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    let export_err = |reason: String| ViewerError::Export {
        path: path.to_path_buf(),
        reason,
    };
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let result = match ext.as_deref() {
        Some("png") => image.save_with_format(path, ImageFormat::Png),
        Some("tif" | "tiff") => image.save_with_format(path, ImageFormat::Tiff),
        // JPEG has no alpha channel.
        Some("jpg" | "jpeg") => {
            DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path, ImageFormat::Jpeg)
        }
        Some(other) => return Err(export_err(format!("unsupported extension '.{other}'"))),
        None => return Err(export_err("missing file extension".into())),
    };
    result.map_err(|e| export_err(e.to_string()))
}

/// Write `row,col` pairs, one per line.
pub fn write_tiles_csv<W: Write>(tiles: &[(usize, usize)], mut out: W) -> std::io::Result<()> {
    for (row, col) in tiles {
        writeln!(out, "{row},{col}")?;
    }
    out.flush()
}

pub fn export_tiles_csv(tiles: &[(usize, usize)], path: &Path) -> Result<()> {
    let export_err = |e: std::io::Error| ViewerError::Export {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let file = File::create(path).map_err(export_err)?;
    write_tiles_csv(tiles, BufWriter::new(file)).map_err(export_err)?;
    info!(path = %path.display(), count = tiles.len(), "Highlighted tiles exported");
    Ok(())
}

/// Parse `row,col` lines. Blank lines are skipped; anything else that is
/// not two unsigned integers is an error naming the line.
pub fn parse_tiles_csv(content: &str, path: &Path) -> Result<Vec<(usize, usize)>> {
    let mut tiles = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = line.split_once(',').and_then(|(r, c)| {
            Some((r.trim().parse::<usize>().ok()?, c.trim().parse::<usize>().ok()?))
        });
        match parsed {
            Some(tile) => tiles.push(tile),
            None => {
                return Err(ViewerError::Export {
                    path: path.to_path_buf(),
                    reason: format!("line {}: expected 'row,col', got '{line}'", idx + 1),
                })
            }
        }
    }
    Ok(tiles)
}

pub fn import_tiles_csv(path: &Path) -> Result<Vec<(usize, usize)>> {
    let content = std::fs::read_to_string(path)?;
    parse_tiles_csv(&content, path)
}
