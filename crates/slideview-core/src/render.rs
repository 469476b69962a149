use std::fmt;

use image::DynamicImage;
use tracing::debug;

use crate::config::ViewerConfig;
use crate::geometry::DisplaySize;
use crate::highlight::HighlightGrid;
use crate::pyramid::Pyramid;
use crate::source::{extract_region, resize_to_fit};
use crate::viewport::ViewportRect;

/// A rendered frame ready for the presentation layer. Its size fits within
/// the display area and matches the viewport's aspect ratio; the frame is
/// meant to be drawn at the display's top-left corner.
#[derive(Clone, Debug)]
pub struct DisplayFrame {
    image: DynamicImage,
}

impl DisplayFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// 3 for RGB, 4 for RGBA; determines the layout of [`Self::as_bytes`].
    pub fn bands(&self) -> u8 {
        self.image.color().channel_count()
    }

    /// Row-major, tightly packed 8-bit pixels.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_bytes()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// Diagnostic summary shown next to each frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewStatus {
    pub image_size: (u32, u32),
    pub viewport: ViewportRect,
    pub level: usize,
    pub level_count: usize,
    pub level_size: (u32, u32),
    pub display: DisplaySize,
}

impl fmt::Display for ViewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Image: {}x{} | View: {} | View size: {}x{} | Cache level: {}/{} ({}x{}) | Display: {}",
            self.image_size.0,
            self.image_size.1,
            self.viewport,
            self.viewport.width(),
            self.viewport.height(),
            self.level,
            self.level_count,
            self.level_size.0,
            self.level_size.1,
            self.display,
        )
    }
}

#[derive(Clone, Debug)]
pub struct RenderOutput {
    pub frame: DisplayFrame,
    pub status: ViewStatus,
    /// Display-to-source scale the frame was rendered at.
    pub scale: f64,
}

/// Render `viewport` for a `display`-sized area.
///
/// Picks a pyramid level, extracts the matching level-space rectangle,
/// resamples it to fit the display and, when `highlight` is given, draws
/// the tile overlay. Returns `None` for an empty display.
pub fn render(
    pyramid: &Pyramid,
    viewport: &ViewportRect,
    display: DisplaySize,
    highlight: Option<&HighlightGrid>,
    config: &ViewerConfig,
) -> Option<RenderOutput> {
    let scale = viewport.display_to_source_scale(display)?;
    let selection = pyramid.select_level(viewport, display);
    let level_image = pyramid.level_image(selection.level);

    let region = extract_region(
        level_image,
        selection.left,
        selection.top,
        selection.width,
        selection.height,
    );
    let mut image = resize_to_fit(&region, display, config.render.filter.filter_type());

    if let Some(grid) = highlight {
        grid.draw_overlay(&mut image, viewport, scale, &config.highlight);
    }

    debug!(
        level = selection.level,
        frame_w = image.width(),
        frame_h = image.height(),
        "Frame rendered"
    );

    let source = pyramid.source();
    Some(RenderOutput {
        frame: DisplayFrame { image },
        status: ViewStatus {
            image_size: (source.width(), source.height()),
            viewport: *viewport,
            level: selection.level,
            level_count: pyramid.level_count(),
            level_size: (level_image.width(), level_image.height()),
            display,
        },
        scale,
    })
}
