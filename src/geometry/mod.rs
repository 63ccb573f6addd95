//! Geometric primitives and the screen-to-page coordinate transform.
//!
//! Two coordinate systems meet here. The overlay works in *screen space*:
//! origin at the top-left of the rendered page, Y increasing downward,
//! pixel units. The output document works in *page space*: origin at the
//! bottom-left, Y increasing upward, PDF points. The transform flips and
//! rebases the Y axis and divides out the render scale.

use serde::{Deserialize, Serialize};

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Check that both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height of an element or page region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Size {
    /// Create a new size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Check that both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }

    /// Clamp both dimensions to the inclusive range `[min, max]`.
    pub fn clamp(&self, min: f64, max: f64) -> Size {
        Size {
            width: self.width.clamp(min, max),
            height: self.height.clamp(min, max),
        }
    }
}

/// A rectangle described by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of the origin corner
    pub x: f64,
    /// Y coordinate of the origin corner
    pub y: f64,
    /// Width of rectangle
    pub width: f64,
    /// Height of rectangle
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from a position and a size.
    pub fn from_parts(position: Point, size: Size) -> Self {
        Self {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        }
    }

    /// Check that all four components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Dimensions of a single document page plus the scale it is rendered at.
///
/// `render_scale` is screen pixels per PDF point, derived as
/// `rendered_width / page_width`. At scale 1 the on-screen raster matches
/// the page's native point size and the transform degenerates to a pure
/// Y-flip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMetrics {
    /// Page width in PDF points
    pub page_width: f64,
    /// Page height in PDF points
    pub page_height: f64,
    /// Screen pixels per PDF point
    pub render_scale: f64,
}

impl PageMetrics {
    /// Create page metrics with an explicit render scale.
    pub fn new(page_width: f64, page_height: f64, render_scale: f64) -> Self {
        Self {
            page_width,
            page_height,
            render_scale,
        }
    }

    /// Create page metrics from the on-screen width of the rendered page.
    pub fn from_rendered_width(page_width: f64, page_height: f64, rendered_width: f64) -> Self {
        Self {
            page_width,
            page_height,
            render_scale: rendered_width / page_width,
        }
    }

    /// On-screen pixel size of the rendered page.
    pub fn rendered_size(&self) -> Size {
        Size::new(
            self.page_width * self.render_scale,
            self.page_height * self.render_scale,
        )
    }

    /// Convert a screen-space rectangle to page space.
    ///
    /// Screen space has a top-left origin with Y growing downward; page
    /// space has a bottom-left origin with Y growing upward. The returned
    /// rectangle's `(x, y)` is the bottom-left corner expected by PDF
    /// drawing operators.
    pub fn to_page_space(&self, rect: Rect) -> Rect {
        let s = self.render_scale;
        Rect {
            x: rect.x / s,
            y: self.page_height - rect.y / s - rect.height / s,
            width: rect.width / s,
            height: rect.height / s,
        }
    }

    /// Convert a page-space rectangle back to screen space.
    ///
    /// Inverse of [`to_page_space`](Self::to_page_space).
    pub fn to_screen_space(&self, rect: Rect) -> Rect {
        let s = self.render_scale;
        Rect {
            x: rect.x * s,
            y: (self.page_height - rect.y - rect.height) * s,
            width: rect.width * s,
            height: rect.height * s,
        }
    }
}
