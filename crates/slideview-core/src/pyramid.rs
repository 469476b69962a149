//! Multi-resolution cache of the source image.
//!
//! Level 0 is the source itself; each further level is the previous one
//! box-downsampled by the configured factor `S`. When the view is zoomed
//! out, the renderer reads from the coarsest level that still has at least
//! one source pixel per display pixel, so a gigapixel slide never has to be
//! resampled from full resolution.

use image::{DynamicImage, ImageBuffer, Pixel};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::PyramidConfig;
use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, ViewerError};
use crate::geometry::{round_px, DisplaySize};
use crate::source::SourceImage;
use crate::viewport::ViewportRect;

/// The source image plus its downsampled levels.
#[derive(Debug)]
pub struct Pyramid {
    source: SourceImage,
    reduced: Vec<DynamicImage>,
    factor: u32,
}

impl Pyramid {
    /// Build every level for `source`. A level that cannot be produced aborts
    /// the whole build.
    pub fn build(source: SourceImage, config: &PyramidConfig) -> Result<Self> {
        let plan = plan_levels(
            source.width(),
            source.height(),
            config.downsample_factor,
            config.min_level_size,
        );

        let mut reduced: Vec<DynamicImage> = Vec::with_capacity(plan.len().saturating_sub(1));
        for &(width, height) in plan.iter().skip(1) {
            let previous = reduced.last().unwrap_or(source.image());
            let next = box_downsample(previous, config.downsample_factor).ok_or(
                ViewerError::InvalidDimensions { width, height },
            )?;
            debug!(width = next.width(), height = next.height(), "Pyramid level built");
            reduced.push(next);
        }

        info!(
            levels = plan.len(),
            factor = config.downsample_factor,
            "Pyramid cache ready"
        );

        Ok(Self {
            source,
            reduced,
            factor: config.downsample_factor,
        })
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn factor(&self) -> u32 {
        self.factor
    }

    /// Number of levels, including level 0.
    pub fn level_count(&self) -> usize {
        self.reduced.len() + 1
    }

    /// Pixels of level `index`; indices past the coarsest level clamp to it.
    pub fn level_image(&self, index: usize) -> &DynamicImage {
        match index {
            0 => self.source.image(),
            i => self
                .reduced
                .get(i - 1)
                .or(self.reduced.last())
                .unwrap_or(self.source.image()),
        }
    }

    pub fn level_dimensions(&self) -> Vec<(u32, u32)> {
        (0..self.level_count())
            .map(|i| {
                let img = self.level_image(i);
                (img.width(), img.height())
            })
            .collect()
    }

    /// Pick the level and level-space rectangle for rendering `viewport`
    /// into `display`.
    pub fn select_level(&self, viewport: &ViewportRect, display: DisplaySize) -> LevelSelection {
        select_level(&self.level_dimensions(), self.factor, viewport, display)
    }
}

/// Dimensions of every level the builder will produce.
///
/// A downsampled level is kept only when its geometric mean `sqrt(w*h)` is
/// at least `min_size`, and never when either side would be zero.
pub fn plan_levels(width: u32, height: u32, factor: u32, min_size: u32) -> Vec<(u32, u32)> {
    let mut levels = vec![(width, height)];
    if factor < 2 {
        return levels;
    }
    loop {
        let &(w, h) = levels.last().unwrap_or(&(width, height));
        let (next_w, next_h) = (w / factor, h / factor);
        if next_w == 0 || next_h == 0 {
            break;
        }
        let mean = ((next_w as f64) * (next_h as f64)).sqrt();
        if mean < min_size as f64 {
            break;
        }
        levels.push((next_w, next_h));
    }
    levels
}

/// Result of level selection: which level to read and where.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelSelection {
    pub level: usize,
    /// Cumulative downsample of the level relative to level 0 (`S^level`).
    pub scale: f64,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Choose the coarsest level whose cumulative scale does not exceed the
/// display-to-source scale, then map `viewport` into that level.
///
/// With an empty display the coarsest level is chosen.
pub fn select_level(
    level_dims: &[(u32, u32)],
    factor: u32,
    viewport: &ViewportRect,
    display: DisplaySize,
) -> LevelSelection {
    let coarsest = level_dims.len().saturating_sub(1);
    let level_scale = |i: usize| (factor as f64).powi(i as i32);

    let level = match viewport.display_to_source_scale(display) {
        None => coarsest,
        Some(required) => (0..=coarsest)
            .rev()
            .find(|&i| level_scale(i) <= required)
            .unwrap_or(0),
    };

    let scale = level_scale(level);
    let (level_w, level_h) = level_dims.get(level).copied().unwrap_or((1, 1));

    let (left, width) = map_span(viewport.left, viewport.right, scale, level_w);
    let (top, height) = map_span(viewport.top, viewport.bottom, scale, level_h);

    LevelSelection {
        level,
        scale,
        left,
        top,
        width,
        height,
    }
}

/// Divide a level-0 span by `scale` and clip it to `limit`.
fn map_span(start: i64, end: i64, scale: f64, limit: u32) -> (u32, u32) {
    let limit = limit.max(1) as i64;
    let lo = round_px(start as f64 / scale).clamp(0, limit - 1);
    let hi = round_px(end as f64 / scale).clamp(lo + 1, limit);
    (lo as u32, (hi - lo) as u32)
}

/// Average `factor`x`factor` blocks. Trailing rows/columns that do not fill
/// a whole block are dropped, matching the truncating level sizes.
///
/// Returns `None` when the result would be empty.
pub fn box_downsample(image: &DynamicImage, factor: u32) -> Option<DynamicImage> {
    if factor == 0 || image.width() / factor == 0 || image.height() / factor == 0 {
        return None;
    }
    match image {
        DynamicImage::ImageRgb8(buf) => downsample_buffer(buf, factor).map(DynamicImage::ImageRgb8),
        DynamicImage::ImageRgba8(buf) => {
            downsample_buffer(buf, factor).map(DynamicImage::ImageRgba8)
        }
        other if other.color().has_alpha() => {
            downsample_buffer(&other.to_rgba8(), factor).map(DynamicImage::ImageRgba8)
        }
        other => downsample_buffer(&other.to_rgb8(), factor).map(DynamicImage::ImageRgb8),
    }
}

fn downsample_buffer<P>(src: &ImageBuffer<P, Vec<u8>>, factor: u32) -> Option<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8>,
{
    let channels = P::CHANNEL_COUNT as usize;
    let (src_w, _) = src.dimensions();
    let (dst_w, dst_h) = (src.width() / factor, src.height() / factor);
    let src_raw: &[u8] = src.as_raw();
    let src_stride = src_w as usize * channels;
    let dst_stride = dst_w as usize * channels;
    let f = factor as usize;
    let block_area = (f * f) as u32;

    let fill_row = |(row, out): (usize, &mut [u8])| {
        let mut sums = vec![0u32; channels];
        for col in 0..dst_w as usize {
            sums.iter_mut().for_each(|s| *s = 0);
            for dy in 0..f {
                let line = (row * f + dy) * src_stride;
                for dx in 0..f {
                    let px = line + (col * f + dx) * channels;
                    for (c, sum) in sums.iter_mut().enumerate() {
                        *sum += src_raw[px + c] as u32;
                    }
                }
            }
            for (c, sum) in sums.iter().enumerate() {
                out[col * channels + c] = ((sum + block_area / 2) / block_area) as u8;
            }
        }
    };

    let mut out = vec![0u8; dst_stride * dst_h as usize];
    if (dst_w as usize) * (dst_h as usize) >= PARALLEL_PIXEL_THRESHOLD {
        out.par_chunks_mut(dst_stride).enumerate().for_each(fill_row);
    } else {
        out.chunks_mut(dst_stride).enumerate().for_each(fill_row);
    }

    ImageBuffer::from_raw(dst_w, dst_h, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_span_clips_to_level() {
        assert_eq!(map_span(0, 400, 4.0, 100), (0, 100));
        assert_eq!(map_span(390, 420, 4.0, 100), (98, 2));
        assert_eq!(map_span(400, 404, 4.0, 100), (99, 1));
    }

    #[test]
    fn test_plan_levels_factor_one_is_single_level() {
        assert_eq!(plan_levels(5000, 5000, 1, 10), vec![(5000, 5000)]);
    }
}
