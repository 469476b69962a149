use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageError, ImageReader};
use tracing::info;

use crate::error::{Result, ViewerError};
use crate::geometry::{round_px, DisplaySize};

/// The decoded full-resolution image, normalised to 8-bit RGB or RGBA.
#[derive(Clone, Debug)]
pub struct SourceImage {
    path: PathBuf,
    image: DynamicImage,
}

impl SourceImage {
    /// Decode a file. Decoder allocation limits are lifted since slides are
    /// routinely larger than the defaults allow.
    pub fn open(path: &Path) -> Result<Self> {
        let decode_err = |source: ImageError| ViewerError::Decode {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| decode_err(ImageError::IoError(e)))?;
        reader.no_limits();
        let decoded = reader.decode().map_err(decode_err)?;

        let source = Self::from_dynamic(path.to_path_buf(), decoded)?;
        info!(
            path = %path.display(),
            width = source.width(),
            height = source.height(),
            bands = source.bands(),
            "Source image decoded"
        );
        Ok(source)
    }

    /// Wrap an already decoded image. Zero-sized images are rejected.
    pub fn from_dynamic(path: PathBuf, image: DynamicImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ViewerError::InvalidDimensions {
                width: image.width(),
                height: image.height(),
            });
        }
        Ok(Self {
            path,
            image: normalize_bands(image),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// 3 for RGB, 4 for RGBA.
    pub fn bands(&self) -> u8 {
        self.image.color().channel_count()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// Convert any decoded layout to RGB8, or RGBA8 when the source carries alpha.
pub fn normalize_bands(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.into_rgba8()),
        other => DynamicImage::ImageRgb8(other.into_rgb8()),
    }
}

/// Copy a rectangle out of `image`, clipped to the image bounds.
pub fn extract_region(image: &DynamicImage, left: u32, top: u32, width: u32, height: u32) -> DynamicImage {
    let left = left.min(image.width().saturating_sub(1));
    let top = top.min(image.height().saturating_sub(1));
    let width = width.clamp(1, image.width().saturating_sub(left).max(1));
    let height = height.clamp(1, image.height().saturating_sub(top).max(1));
    image.crop_imm(left, top, width, height)
}

/// Resample by a uniform scale factor.
pub fn resample(image: &DynamicImage, scale: f64, filter: image::imageops::FilterType) -> DynamicImage {
    let width = round_px(image.width() as f64 * scale).max(1) as u32;
    let height = round_px(image.height() as f64 * scale).max(1) as u32;
    resize_exact(image, width, height, filter)
}

/// Resample to the largest size that fits within `target` while keeping
/// the aspect ratio (scale = `min(targetW/srcW, targetH/srcH)`).
pub fn resize_to_fit(image: &DynamicImage, target: DisplaySize, filter: image::imageops::FilterType) -> DynamicImage {
    let scale = fit_scale(image.width(), image.height(), target);
    let width = (round_px(image.width() as f64 * scale).max(1) as u32).min(target.width.max(1));
    let height = (round_px(image.height() as f64 * scale).max(1) as u32).min(target.height.max(1));
    resize_exact(image, width, height, filter)
}

/// Scale factor that fits a `width`x`height` image inside `target`.
pub fn fit_scale(width: u32, height: u32, target: DisplaySize) -> f64 {
    (target.width as f64 / width as f64).min(target.height as f64 / height as f64)
}

fn resize_exact(image: &DynamicImage, width: u32, height: u32, filter: image::imageops::FilterType) -> DynamicImage {
    if width == image.width() && height == image.height() {
        return image.clone();
    }
    image.resize_exact(width, height, filter)
}
