use std::fmt;
use std::path::Path;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_FILL_COLOR, DEFAULT_GRID_COLOR, DEFAULT_ZOOM_STEP, DOWNSAMPLE_FACTOR,
    MIN_CACHE_IMAGE_SIZE, MIN_SELECTION_PX,
};
use crate::error::{Result, ViewerError};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub pyramid: PyramidConfig,
    #[serde(default)]
    pub zoom: ZoomConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
}

impl ViewerConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ViewerConfig = toml::from_str(&content)
            .map_err(|e| ViewerError::InvalidConfig(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ViewerError::InvalidConfig(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pyramid.downsample_factor < 2 {
            return Err(ViewerError::InvalidConfig(format!(
                "downsample_factor must be >= 2 (got {})",
                self.pyramid.downsample_factor
            )));
        }
        if self.pyramid.min_level_size == 0 {
            return Err(ViewerError::InvalidConfig(
                "min_level_size must be > 0".into(),
            ));
        }
        if self.zoom.step_factor.is_nan() || self.zoom.step_factor <= 1.0 {
            return Err(ViewerError::InvalidConfig(format!(
                "zoom step_factor must be > 1 (got {})",
                self.zoom.step_factor
            )));
        }
        if self.zoom.min_selection_px < 0.0 {
            return Err(ViewerError::InvalidConfig(
                "min_selection_px must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidConfig {
    /// Linear downsample factor between levels (S).
    pub downsample_factor: u32,
    /// Geometric-mean threshold below which no further level is kept (M).
    pub min_level_size: u32,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            downsample_factor: DOWNSAMPLE_FACTOR,
            min_level_size: MIN_CACHE_IMAGE_SIZE,
        }
    }
}

/// Which point stays put when zooming at a display position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomAnchor {
    /// The source pixel under the pointer stays under the pointer.
    #[default]
    Cursor,
    /// The view is recentred on the source pixel under the pointer.
    Recenter,
}

impl fmt::Display for ZoomAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cursor => write!(f, "Cursor"),
            Self::Recenter => write!(f, "Recenter"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub step_factor: f64,
    pub anchor: ZoomAnchor,
    pub min_selection_px: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            step_factor: DEFAULT_ZOOM_STEP,
            anchor: ZoomAnchor::default(),
            min_selection_px: MIN_SELECTION_PX,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl ResampleFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => write!(f, "Nearest"),
            Self::Triangle => write!(f, "Triangle"),
            Self::CatmullRom => write!(f, "Catmull-Rom"),
            Self::Lanczos3 => write!(f, "Lanczos3"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub filter: ResampleFilter,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// RGBA of the tile boundary lines.
    pub grid_color: [u8; 4],
    /// RGBA of the fill over highlighted tiles.
    pub fill_color: [u8; 4],
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            grid_color: DEFAULT_GRID_COLOR,
            fill_color: DEFAULT_FILL_COLOR,
        }
    }
}
