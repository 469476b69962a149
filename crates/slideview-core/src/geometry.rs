//! Display-space value types shared by the viewport, renderer and session.
//!
//! Display coordinates are pixels within the on-screen rendering surface,
//! origin top-left. They are kept as `f64` because pointer positions from
//! the presentation layer are fractional.

use std::fmt;

/// Pixel dimensions of the display area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl DisplaySize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True while the widget has not been laid out yet.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn center(&self) -> DisplayPoint {
        DisplayPoint::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

impl fmt::Display for DisplaySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayPoint {
    pub x: f64,
    pub y: f64,
}

impl DisplayPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Two display-space corners, in any order (as dragged by the user).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl DisplayRect {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn from_points(start: DisplayPoint, end: DisplayPoint) -> Self {
        Self::new(start.x, start.y, end.x, end.y)
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    pub fn center(&self) -> DisplayPoint {
        DisplayPoint::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Corners reordered so that `x1 <= x2` and `y1 <= y2`.
    pub fn normalized(&self) -> Self {
        Self::new(
            self.x1.min(self.x2),
            self.y1.min(self.y2),
            self.x1.max(self.x2),
            self.y1.max(self.y2),
        )
    }

    /// Pointer movement from the first corner to the second.
    pub fn delta(&self) -> (f64, f64) {
        (self.x2 - self.x1, self.y2 - self.y1)
    }

    /// True when either side is shorter than `min_px`.
    pub fn is_degenerate(&self, min_px: f64) -> bool {
        self.width() < min_px || self.height() < min_px
    }
}

/// Convert a computed coordinate or size to an integer pixel value.
///
/// Every float-to-integer conversion in the crate goes through here, so the
/// whole viewer rounds half away from zero.
pub fn round_px(value: f64) -> i64 {
    value.round() as i64
}
