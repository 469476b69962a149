/// Linear downsample factor between consecutive pyramid levels.
pub const DOWNSAMPLE_FACTOR: u32 = 4;

/// Geometric-mean size (`sqrt(w*h)`) a downsampled level must reach to be
/// kept in the pyramid.
pub const MIN_CACHE_IMAGE_SIZE: u32 = 1000;

/// Zoom factor applied by a single zoom-in / zoom-out gesture.
pub const DEFAULT_ZOOM_STEP: f64 = 2.0;

/// Selections narrower or shorter than this (display pixels) are ignored.
pub const MIN_SELECTION_PX: f64 = 5.0;

/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Default RGBA of the tile boundary lines.
pub const DEFAULT_GRID_COLOR: [u8; 4] = [255, 255, 255, 90];

/// Default RGBA of the fill drawn over highlighted tiles.
pub const DEFAULT_FILL_COLOR: [u8; 4] = [255, 196, 0, 100];
