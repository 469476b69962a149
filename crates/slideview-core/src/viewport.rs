//! Source-space viewport and the gestures that move it.
//!
//! The viewport is the rectangle of level-0 pixels currently mapped onto the
//! display area. Display content is anchored at the display's top-left, so a
//! display point `p` corresponds to source point `rect.left/top + p * s`,
//! where `s` is the display-to-source scale (the larger of the two axis
//! ratios). Every mutation ends with [`clamp_rect`], which keeps the
//! rectangle inside the image.

use std::fmt;

use tracing::debug;

use crate::config::ZoomAnchor;
use crate::geometry::{round_px, DisplayPoint, DisplayRect, DisplaySize};

/// Viewport bounds in level-0 pixel coordinates. `right`/`bottom` are
/// exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewportRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl ViewportRect {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The whole image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i64, height as i64)
    }

    /// Place a rectangle from fractional origin and size. Origin and size
    /// are rounded independently so that the size never drifts with the
    /// position; the size is at least one pixel.
    pub fn from_origin_size(left: f64, top: f64, width: f64, height: f64) -> Self {
        let left = round_px(left);
        let top = round_px(top);
        Self::new(
            left,
            top,
            left.saturating_add(round_px(width).max(1)),
            top.saturating_add(round_px(height).max(1)),
        )
    }

    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.left + self.right) as f64 / 2.0,
            (self.top + self.bottom) as f64 / 2.0,
        )
    }

    /// `max(width/displayWidth, height/displayHeight)`, or `None` for an
    /// empty display.
    pub fn display_to_source_scale(&self, display: DisplaySize) -> Option<f64> {
        if display.is_empty() {
            return None;
        }
        let sx = self.width() as f64 / display.width as f64;
        let sy = self.height() as f64 / display.height as f64;
        Some(sx.max(sy))
    }

    /// True when `0 <= left < right <= width` and likewise vertically.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        0 <= self.left
            && self.left < self.right
            && self.right <= width as i64
            && 0 <= self.top
            && self.top < self.bottom
            && self.bottom <= height as i64
    }
}

impl fmt::Display for ViewportRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Fit `rect` inside a `width`x`height` image.
///
/// Overflow past the right/bottom edge is shifted back left/up, then a
/// negative left/top is shifted to zero by growing right/bottom, and only
/// then is right/bottom cut at the image edge. Size is preserved whenever
/// it fits; position gives way first.
pub fn clamp_rect(rect: ViewportRect, width: u32, height: u32) -> ViewportRect {
    let (w, h) = (width as i64, height as i64);
    let ViewportRect {
        mut left,
        mut top,
        mut right,
        mut bottom,
    } = rect;

    if right <= left {
        right = left.saturating_add(1);
    }
    if bottom <= top {
        bottom = top.saturating_add(1);
    }

    if right > w {
        left = left.saturating_sub(right - w);
        right = w;
    }
    if bottom > h {
        top = top.saturating_sub(bottom - h);
        bottom = h;
    }

    if left < 0 {
        right = right.saturating_sub(left);
        left = 0;
    }
    if top < 0 {
        bottom = bottom.saturating_sub(top);
        top = 0;
    }

    right = right.min(w);
    bottom = bottom.min(h);

    ViewportRect::new(left, top, right, bottom)
}

/// The viewport of one open image.
#[derive(Clone, Debug)]
pub struct Viewport {
    rect: ViewportRect,
    image_width: u32,
    image_height: u32,
    /// Display-to-source scale of the last rendered frame.
    last_scale: Option<f64>,
}

impl Viewport {
    /// A viewport showing the whole image.
    pub fn new(image_width: u32, image_height: u32) -> Self {
        Self {
            rect: ViewportRect::full(image_width, image_height),
            image_width,
            image_height,
            last_scale: None,
        }
    }

    pub fn rect(&self) -> ViewportRect {
        self.rect
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    pub fn reset(&mut self) {
        self.rect = ViewportRect::full(self.image_width, self.image_height);
        self.last_scale = None;
    }

    /// Replace the rectangle; the result is clamped.
    pub fn set_rect(&mut self, rect: ViewportRect) {
        self.rect = clamp_rect(rect, self.image_width, self.image_height);
    }

    pub fn scale(&self, display: DisplaySize) -> Option<f64> {
        self.rect.display_to_source_scale(display)
    }

    pub fn last_scale(&self) -> Option<f64> {
        self.last_scale
    }

    /// Remember the scale a frame was rendered at; `resize` preserves it.
    pub fn record_render_scale(&mut self, scale: f64) {
        self.last_scale = Some(scale);
    }

    /// Map a display point to source coordinates.
    pub fn display_to_source(&self, point: DisplayPoint, display: DisplaySize) -> Option<(f64, f64)> {
        let s = self.scale(display)?;
        Some((
            self.rect.left as f64 + point.x * s,
            self.rect.top as f64 + point.y * s,
        ))
    }

    /// Move the view opposite to a pointer drag of `(dx, dy)` display pixels.
    pub fn pan(&mut self, delta: (f64, f64), display: DisplaySize) -> bool {
        let Some(s) = self.scale(display) else {
            return false;
        };
        // Any shift past the image extent clamps to the same edge.
        let (w, h) = (self.image_width as i64, self.image_height as i64);
        let dx = round_px(delta.0 * s).clamp(-w, w);
        let dy = round_px(delta.1 * s).clamp(-h, h);
        let r = self.rect;
        self.apply(ViewportRect::new(
            r.left.saturating_sub(dx),
            r.top.saturating_sub(dy),
            r.right.saturating_sub(dx),
            r.bottom.saturating_sub(dy),
        ));
        debug!(rect = %self.rect, "Pan");
        true
    }

    /// Zoom by `factor` (> 1 zooms in) at a display position.
    ///
    /// The size basis is the display area filled at the current scale, so a
    /// letterboxed view takes on the display's aspect after the first zoom.
    pub fn zoom_at(
        &mut self,
        center: DisplayPoint,
        factor: f64,
        anchor: ZoomAnchor,
        display: DisplaySize,
    ) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let Some(s) = self.scale(display) else {
            return false;
        };
        let (px, py) = (
            self.rect.left as f64 + center.x * s,
            self.rect.top as f64 + center.y * s,
        );
        let new_w = display.width as f64 * s / factor;
        let new_h = display.height as f64 * s / factor;

        let (left, top) = match anchor {
            ZoomAnchor::Cursor => (px - center.x * s / factor, py - center.y * s / factor),
            ZoomAnchor::Recenter => (px - new_w / 2.0, py - new_h / 2.0),
        };
        self.apply(ViewportRect::from_origin_size(left, top, new_w, new_h));
        debug!(factor, rect = %self.rect, "Zoom");
        true
    }

    /// Zoom so that `selection` fills the display. Selections with a side
    /// shorter than `min_px` are ignored.
    pub fn select_zoom(&mut self, selection: DisplayRect, display: DisplaySize, min_px: f64) -> bool {
        if selection.width() <= 0.0 || selection.height() <= 0.0 || selection.is_degenerate(min_px) {
            return false;
        }
        let Some(s) = self.scale(display) else {
            return false;
        };
        let ratio = (selection.width() / display.width as f64)
            .max(selection.height() / display.height as f64);
        let center = selection.center();
        let (px, py) = (
            self.rect.left as f64 + center.x * s,
            self.rect.top as f64 + center.y * s,
        );
        let new_w = display.width as f64 * s * ratio;
        let new_h = display.height as f64 * s * ratio;
        self.apply(ViewportRect::from_origin_size(
            px - new_w / 2.0,
            py - new_h / 2.0,
            new_w,
            new_h,
        ));
        debug!(rect = %self.rect, "Select zoom");
        true
    }

    /// Recompute the rectangle for a new display size, keeping its centre
    /// and the scale of the last rendered frame.
    pub fn resize(&mut self, display: DisplaySize) -> bool {
        if display.is_empty() {
            return false;
        }
        let Some(s) = self.last_scale else {
            return false;
        };
        let (cx, cy) = self.rect.center();
        let new_w = display.width as f64 * s;
        let new_h = display.height as f64 * s;
        self.apply(ViewportRect::from_origin_size(
            cx - new_w / 2.0,
            cy - new_h / 2.0,
            new_w,
            new_h,
        ));
        let size = display;
        debug!(rect = %self.rect, display = %size, "Resize");
        true
    }

    pub fn clamp(&mut self) {
        self.rect = clamp_rect(self.rect, self.image_width, self.image_height);
    }

    fn apply(&mut self, rect: ViewportRect) {
        self.rect = rect;
        self.clamp();
    }
}
