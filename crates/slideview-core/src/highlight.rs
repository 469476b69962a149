//! Per-tile highlight grid aligned to the source image's native tiling.
//!
//! One boolean cell per native tile, shape `(ceil(H/tileH), ceil(W/tileW))`.
//! Untiled sources get a single cell. The overlay draws translucent tile
//! boundaries and a translucent fill over highlighted cells directly onto a
//! rendered display frame.

use std::ops::Range;

use image::DynamicImage;
use ndarray::Array2;

use crate::config::HighlightConfig;
use crate::geometry::round_px;
use crate::io::tiling::TileLayout;
use crate::viewport::ViewportRect;

#[derive(Clone, Debug)]
pub struct HighlightGrid {
    layout: TileLayout,
    cells: Array2<bool>,
}

impl HighlightGrid {
    pub fn new(layout: TileLayout) -> Self {
        Self {
            cells: Array2::from_elem(layout.grid_shape(), false),
            layout,
        }
    }

    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// Tile containing a source-space point, or `None` outside the grid.
    pub fn tile_at(&self, src_x: f64, src_y: f64) -> Option<(usize, usize)> {
        if src_x < 0.0 || src_y < 0.0 {
            return None;
        }
        let row = (src_y / self.layout.tile_height as f64).floor() as usize;
        let col = (src_x / self.layout.tile_width as f64).floor() as usize;
        let (rows, cols) = self.shape();
        (row < rows && col < cols).then_some((row, col))
    }

    /// Set a cell to `value`, or flip it when `value` is `None`. Returns the
    /// new state, or `None` when the cell is out of range.
    pub fn set(&mut self, row: usize, col: usize, value: Option<bool>) -> Option<bool> {
        let cell = self.cells.get_mut((row, col))?;
        *cell = value.unwrap_or(!*cell);
        Some(*cell)
    }

    /// Toggle/set the tile under a source-space point.
    pub fn set_at_source(&mut self, src_x: f64, src_y: f64, value: Option<bool>) -> Option<(usize, usize)> {
        let (row, col) = self.tile_at(src_x, src_y)?;
        self.set(row, col, value)?;
        Some((row, col))
    }

    pub fn is_highlighted(&self, row: usize, col: usize) -> bool {
        self.cells.get((row, col)).copied().unwrap_or(false)
    }

    /// Highlighted cells in row-major order.
    pub fn highlighted(&self) -> Vec<(usize, usize)> {
        self.cells
            .indexed_iter()
            .filter(|&(_, &on)| on)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&on| on).count()
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// Row and column index ranges overlapping `rect`, rounded outward and
    /// clipped to the grid.
    pub fn visible_range(&self, rect: &ViewportRect) -> (Range<usize>, Range<usize>) {
        let (rows, cols) = self.shape();
        let span = |lo: i64, hi: i64, tile: u32, count: usize| {
            let tile = tile as i64;
            let first = (lo.max(0) / tile) as usize;
            let last = ((hi.max(0) + tile - 1) / tile) as usize;
            first.min(count)..last.min(count)
        };
        (
            span(rect.top, rect.bottom, self.layout.tile_height, rows),
            span(rect.left, rect.right, self.layout.tile_width, cols),
        )
    }

    /// Draw tile boundaries and highlighted fills onto `frame`, which shows
    /// `rect` at display-to-source scale `scale` anchored at its top-left.
    pub fn draw_overlay(
        &self,
        frame: &mut DynamicImage,
        rect: &ViewportRect,
        scale: f64,
        colors: &HighlightConfig,
    ) {
        if scale <= 0.0 {
            return;
        }
        let Some(mut canvas) = Canvas::from_frame(frame) else {
            return;
        };
        let (row_range, col_range) = self.visible_range(rect);
        if row_range.is_empty() || col_range.is_empty() {
            return;
        }

        let (tw, th) = (self.layout.tile_width as i64, self.layout.tile_height as i64);
        let (img_w, img_h) = (self.layout.image_width as i64, self.layout.image_height as i64);
        let to_x = |src: i64| round_px((src - rect.left) as f64 / scale);
        let to_y = |src: i64| round_px((src - rect.top) as f64 / scale);
        let tile_x = |col: usize| (col as i64 * tw).min(img_w);
        let tile_y = |row: usize| (row as i64 * th).min(img_h);

        for row in row_range.clone() {
            for col in col_range.clone() {
                if self.cells[[row, col]] {
                    canvas.fill_rect(
                        to_x(tile_x(col)),
                        to_y(tile_y(row)),
                        to_x(tile_x(col + 1)),
                        to_y(tile_y(row + 1)),
                        colors.fill_color,
                    );
                }
            }
        }

        let y_span = (to_y(tile_y(row_range.start)), to_y(tile_y(row_range.end)));
        let x_span = (to_x(tile_x(col_range.start)), to_x(tile_x(col_range.end)));
        for col in col_range.start..=col_range.end {
            let x = to_x(tile_x(col));
            canvas.fill_rect(x, y_span.0, x + 1, y_span.1, colors.grid_color);
        }
        for row in row_range.start..=row_range.end {
            let y = to_y(tile_y(row));
            canvas.fill_rect(x_span.0, y, x_span.1, y + 1, colors.grid_color);
        }
    }
}

/// Mutable view of an 8-bit RGB/RGBA frame for alpha-over drawing.
struct Canvas<'a> {
    data: &'a mut [u8],
    channels: usize,
    width: i64,
    height: i64,
}

impl<'a> Canvas<'a> {
    fn from_frame(frame: &'a mut DynamicImage) -> Option<Self> {
        let (width, height) = (frame.width() as i64, frame.height() as i64);
        let (data, channels): (&mut [u8], usize) = match frame {
            DynamicImage::ImageRgb8(buf) => (&mut **buf, 3),
            DynamicImage::ImageRgba8(buf) => (&mut **buf, 4),
            _ => return None,
        };
        Some(Self {
            data,
            channels,
            width,
            height,
        })
    }

    /// Blend `color` over the half-open rectangle `[x0, x1) x [y0, y1)`,
    /// clipped to the frame.
    fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: [u8; 4]) {
        if color[3] == 0 {
            return;
        }
        let (x0, x1) = (x0.clamp(0, self.width), x1.clamp(0, self.width));
        let (y0, y1) = (y0.clamp(0, self.height), y1.clamp(0, self.height));
        for y in y0..y1 {
            for x in x0..x1 {
                let idx = ((y * self.width + x) as usize) * self.channels;
                blend_over(&mut self.data[idx..idx + self.channels], color);
            }
        }
    }
}

/// Standard alpha-over of a straight-alpha `color` onto one pixel.
fn blend_over(px: &mut [u8], color: [u8; 4]) {
    let a = color[3] as f32 / 255.0;
    if px.len() == 4 {
        let dst_a = px[3] as f32 / 255.0;
        let out_a = a + dst_a * (1.0 - a);
        if out_a <= 0.0 {
            return;
        }
        for c in 0..3 {
            let v = (color[c] as f32 * a + px[c] as f32 * dst_a * (1.0 - a)) / out_a;
            px[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        px[3] = (out_a * 255.0).round() as u8;
    } else {
        for c in 0..3 {
            let v = color[c] as f32 * a + px[c] as f32 * (1.0 - a);
            px[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
}
