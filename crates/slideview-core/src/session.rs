//! Viewer session: the single owner of the open image, its pyramid,
//! viewport and highlight grid.
//!
//! Front-ends implement [`Presenter`] and forward one already-coalesced
//! gesture at a time. Every gesture that changes the view re-renders
//! synchronously and hands the frame back through the presenter.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::geometry::{DisplayPoint, DisplayRect, DisplaySize};
use crate::highlight::HighlightGrid;
use crate::io::export::{self, CropRect};
use crate::io::tiling::{FileTileReader, TileLayout, TileLayoutReader};
use crate::pyramid::Pyramid;
use crate::render::{render, DisplayFrame, ViewStatus};
use crate::source::SourceImage;
use crate::viewport::{Viewport, ViewportRect};

/// The presentation layer, as seen from the core.
pub trait Presenter {
    /// Current pixel size of the display area (zero before layout).
    fn display_area_size(&self) -> DisplaySize;

    fn show_image(&mut self, frame: &DisplayFrame);

    fn show_statistics(&mut self, text: &str);
}

/// Presenter without a window: keeps the last frame and status line.
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    pub display: DisplaySize,
    pub last_frame: Option<DisplayFrame>,
    pub last_status: String,
    pub frames_shown: usize,
}

impl HeadlessPresenter {
    pub fn new(display: DisplaySize) -> Self {
        Self {
            display,
            ..Default::default()
        }
    }
}

impl Presenter for HeadlessPresenter {
    fn display_area_size(&self) -> DisplaySize {
        self.display
    }

    fn show_image(&mut self, frame: &DisplayFrame) {
        self.last_frame = Some(frame.clone());
        self.frames_shown += 1;
    }

    fn show_statistics(&mut self, text: &str) {
        self.last_status = text.to_string();
    }
}

/// Everything derived from one opened file. Replaced as a unit.
#[derive(Debug)]
struct LoadedSlide {
    pyramid: Pyramid,
    viewport: Viewport,
    highlight: Option<HighlightGrid>,
}

pub struct ViewerSession {
    config: ViewerConfig,
    tile_reader: Box<dyn TileLayoutReader>,
    slide: Option<LoadedSlide>,
    highlight_mode: bool,
}

impl ViewerSession {
    pub fn new(config: ViewerConfig) -> Self {
        Self::with_tile_reader(config, Box::new(FileTileReader))
    }

    pub fn with_tile_reader(config: ViewerConfig, tile_reader: Box<dyn TileLayoutReader>) -> Self {
        Self {
            config,
            tile_reader,
            slide: None,
            highlight_mode: false,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.slide.is_some()
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.slide.as_ref().map(|s| s.pyramid.source())
    }

    pub fn pyramid(&self) -> Option<&Pyramid> {
        self.slide.as_ref().map(|s| &s.pyramid)
    }

    pub fn viewport(&self) -> Option<ViewportRect> {
        self.slide.as_ref().map(|s| s.viewport.rect())
    }

    pub fn highlight_mode(&self) -> bool {
        self.highlight_mode
    }

    pub fn highlight_grid(&self) -> Option<&HighlightGrid> {
        self.slide.as_ref().and_then(|s| s.highlight.as_ref())
    }

    /// Decode `path` and make it the current image. On failure the session
    /// keeps whatever it showed before.
    pub fn open(&mut self, path: &Path, presenter: &mut dyn Presenter) -> Result<()> {
        let source = SourceImage::open(path)?;
        self.load(source, presenter)
    }

    /// Make an already decoded image current.
    pub fn load(&mut self, source: SourceImage, presenter: &mut dyn Presenter) -> Result<()> {
        let (width, height) = (source.width(), source.height());
        let pyramid = Pyramid::build(source, &self.config.pyramid)?;

        self.slide = Some(LoadedSlide {
            pyramid,
            viewport: Viewport::new(width, height),
            highlight: None,
        });
        info!(width, height, "Image loaded");

        if self.highlight_mode {
            self.ensure_highlight_grid()?;
        }
        self.refresh(presenter);
        Ok(())
    }

    /// Render the current view and hand it to the presenter. Returns the
    /// status, or `None` when nothing could be rendered.
    pub fn refresh(&mut self, presenter: &mut dyn Presenter) -> Option<ViewStatus> {
        let display = presenter.display_area_size();
        let slide = self.slide.as_mut()?;
        let overlay = if self.highlight_mode {
            slide.highlight.as_ref()
        } else {
            None
        };

        let output = render(
            &slide.pyramid,
            &slide.viewport.rect(),
            display,
            overlay,
            &self.config,
        )?;
        slide.viewport.record_render_scale(output.scale);

        presenter.show_image(&output.frame);
        presenter.show_statistics(&output.status.to_string());
        Some(output.status)
    }

    pub fn zoom_in(&mut self, presenter: &mut dyn Presenter, center: DisplayPoint, factor: f64) -> bool {
        let anchor = self.config.zoom.anchor;
        self.gesture(presenter, |viewport, display| {
            viewport.zoom_at(center, factor, anchor, display)
        })
    }

    pub fn zoom_out(&mut self, presenter: &mut dyn Presenter, center: DisplayPoint, factor: f64) -> bool {
        if factor <= 0.0 {
            return false;
        }
        self.zoom_in(presenter, center, 1.0 / factor)
    }

    /// Zoom by `step_factor^notches` (negative zooms out), for accumulated
    /// wheel input.
    pub fn zoom_by_notches(&mut self, presenter: &mut dyn Presenter, center: DisplayPoint, notches: i32) -> bool {
        if notches == 0 {
            return false;
        }
        let factor = self.config.zoom.step_factor.powi(notches);
        self.zoom_in(presenter, center, factor)
    }

    /// Zoom so that a display-space selection fills the display.
    pub fn select(&mut self, presenter: &mut dyn Presenter, selection: DisplayRect) -> bool {
        let min_px = self.config.zoom.min_selection_px;
        self.gesture(presenter, |viewport, display| {
            viewport.select_zoom(selection, display, min_px)
        })
    }

    /// Pan by the pointer movement from `(x1, y1)` to `(x2, y2)`.
    pub fn drag(&mut self, presenter: &mut dyn Presenter, movement: DisplayRect) -> bool {
        self.gesture(presenter, |viewport, display| viewport.pan(movement.delta(), display))
    }

    /// The display area changed size.
    pub fn resize(&mut self, presenter: &mut dyn Presenter) -> bool {
        self.gesture(presenter, |viewport, display| viewport.resize(display))
    }

    /// Replace the viewport rectangle directly (clamped).
    pub fn set_viewport(&mut self, presenter: &mut dyn Presenter, rect: ViewportRect) -> bool {
        self.gesture(presenter, |viewport, _| {
            viewport.set_rect(rect);
            true
        })
    }

    /// Turn highlight mode on/off, or flip it when `mode` is `None`.
    /// Enabling builds the tile grid on first use.
    pub fn set_highlight_mode(&mut self, presenter: &mut dyn Presenter, mode: Option<bool>) -> Result<bool> {
        let enabled = mode.unwrap_or(!self.highlight_mode);
        if enabled && self.slide.is_some() {
            self.ensure_highlight_grid()?;
        }
        self.highlight_mode = enabled;
        debug!(enabled, "Highlight mode");
        self.refresh(presenter);
        Ok(enabled)
    }

    /// Create the highlight grid for the open image if it does not exist.
    pub fn ensure_highlight_grid(&mut self) -> Result<&HighlightGrid> {
        let slide = self
            .slide
            .as_mut()
            .ok_or_else(|| ViewerError::InvalidState("no image is open".into()))?;

        if slide.highlight.is_none() {
            let source = slide.pyramid.source();
            let layout = match self.tile_reader.read_layout(source.path()) {
                Ok(layout) => layout,
                Err(e) => {
                    warn!(
                        path = %source.path().display(),
                        error = %e,
                        "Tiling metadata unavailable, treating image as untiled"
                    );
                    TileLayout::untiled(source.width(), source.height())
                }
            };
            let (rows, cols) = layout.grid_shape();
            info!(rows, cols, tiled = layout.tiled, "Highlight grid created");
            slide.highlight = Some(HighlightGrid::new(layout));
        }

        slide
            .highlight
            .as_ref()
            .ok_or_else(|| ViewerError::InvalidState("highlight grid missing".into()))
    }

    /// Toggle (or set to `value`) the tile under a display point. Points
    /// outside the grid are ignored and yield `Ok(None)`.
    pub fn toggle_tile(
        &mut self,
        presenter: &mut dyn Presenter,
        point: DisplayPoint,
        value: Option<bool>,
    ) -> Result<Option<(usize, usize)>> {
        let display = presenter.display_area_size();
        let slide = self.initialized_slide_mut()?;
        let Some((src_x, src_y)) = slide.viewport.display_to_source(point, display) else {
            return Ok(None);
        };
        let Some(grid) = slide.highlight.as_mut() else {
            return Err(not_initialized());
        };
        let tile = grid.set_at_source(src_x, src_y, value);
        if let Some((row, col)) = tile {
            debug!(row, col, on = grid.is_highlighted(row, col), "Tile toggled");
            self.refresh(presenter);
        }
        Ok(tile)
    }

    /// Highlighted `(row, col)` cells in row-major order.
    pub fn highlighted_tiles(&self) -> Result<Vec<(usize, usize)>> {
        self.highlight_grid()
            .map(HighlightGrid::highlighted)
            .ok_or_else(not_initialized)
    }

    pub fn clear_highlights(&mut self, presenter: &mut dyn Presenter) -> Result<()> {
        let slide = self.initialized_slide_mut()?;
        if let Some(grid) = slide.highlight.as_mut() {
            grid.clear();
        }
        self.refresh(presenter);
        Ok(())
    }

    /// Write the highlighted tiles as `row,col` lines. Returns how many were
    /// written.
    pub fn export_highlighted_tiles(&self, path: &Path) -> Result<usize> {
        let tiles = self.highlighted_tiles()?;
        export::export_tiles_csv(&tiles, path)?;
        Ok(tiles.len())
    }

    /// Mark every tile listed in a `row,col` file. Entries outside the grid
    /// are skipped. Returns how many were applied.
    pub fn import_highlighted_tiles(&mut self, presenter: &mut dyn Presenter, path: &Path) -> Result<usize> {
        let tiles = export::import_tiles_csv(path)?;
        let slide = self.initialized_slide_mut()?;
        let Some(grid) = slide.highlight.as_mut() else {
            return Err(not_initialized());
        };
        let applied = tiles
            .iter()
            .filter(|&&(row, col)| grid.set(row, col, Some(true)).is_some())
            .count();
        info!(path = %path.display(), applied, skipped = tiles.len() - applied, "Highlighted tiles imported");
        self.refresh(presenter);
        Ok(applied)
    }

    /// Export the full-resolution pixels under a display-space selection.
    /// Returns the exported source rectangle, or `None` when there was
    /// nothing to export.
    pub fn save_crop(&self, presenter: &dyn Presenter, selection: DisplayRect, path: &Path) -> Result<Option<CropRect>> {
        let Some(slide) = self.slide.as_ref() else {
            return Ok(None);
        };
        let display = presenter.display_area_size();
        let Some(crop) = CropRect::from_selection(selection, display, &slide.viewport.rect()) else {
            return Ok(None);
        };
        export::save_crop(slide.pyramid.source(), &crop, path)?;
        Ok(Some(crop))
    }

    fn gesture(
        &mut self,
        presenter: &mut dyn Presenter,
        apply: impl FnOnce(&mut Viewport, DisplaySize) -> bool,
    ) -> bool {
        let display = presenter.display_area_size();
        let Some(slide) = self.slide.as_mut() else {
            return false;
        };
        if !apply(&mut slide.viewport, display) {
            return false;
        }
        self.refresh(presenter);
        true
    }

    fn initialized_slide_mut(&mut self) -> Result<&mut LoadedSlide> {
        match self.slide.as_mut() {
            Some(slide) if slide.highlight.is_some() => Ok(slide),
            _ => Err(not_initialized()),
        }
    }
}

fn not_initialized() -> ViewerError {
    ViewerError::InvalidState("highlight mode has not been initialised".into())
}
