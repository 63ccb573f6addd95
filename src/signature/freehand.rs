//! Freehand signature drawing surface.
//!
//! A pressure-less polyline capture canvas. Pointer-down begins a new
//! subpath, pointer-move appends a point and strokes the segment
//! immediately (immediate mode, nothing is deferred to save time), and
//! pointer-up or pointer-leave ends the subpath. The canvas owns its
//! raster; dropping it releases everything.

use image::{ImageOutputFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::elements::SignatureFormat;
use crate::error::{Error, Result};
use crate::signature::CapturedSignature;

/// Default capture surface width in pixels.
pub const DEFAULT_WIDTH: u32 = 400;

/// Default capture surface height in pixels.
pub const DEFAULT_HEIGHT: u32 = 150;

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const BLANK: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// In-memory drawing surface for freehand signatures.
#[derive(Debug)]
pub struct FreehandCanvas {
    image: RgbaImage,
    last_point: Option<(f32, f32)>,
    dirty: bool,
}

impl FreehandCanvas {
    /// Create a blank canvas at the default capture size.
    pub fn new() -> Self {
        Self::with_size(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Create a blank canvas with explicit dimensions.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), BLANK),
            last_point: None,
            dirty: false,
        }
    }

    /// Canvas dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Whether any ink has been laid down since creation or the last
    /// [`clear`](Self::clear).
    pub fn is_blank(&self) -> bool {
        !self.dirty
    }

    /// Begin a new subpath at the pointer position.
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.last_point = Some((x, y));
    }

    /// Extend the current subpath, stroking the new segment immediately.
    ///
    /// Ignored when no subpath is open (pointer is up).
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let Some((px, py)) = self.last_point else {
            return;
        };
        draw_line_segment_mut(&mut self.image, (px, py), (x, y), INK);
        // A second pass one pixel down thickens the stroke enough to
        // survive downscaling in the overlay box.
        draw_line_segment_mut(&mut self.image, (px, py + 1.0), (x, y + 1.0), INK);
        self.last_point = Some((x, y));
        self.dirty = true;
    }

    /// End the current subpath (pointer up or pointer left the surface).
    pub fn pointer_up(&mut self) {
        self.last_point = None;
    }

    /// Reset the entire surface to blank.
    pub fn clear(&mut self) {
        let (w, h) = self.image.dimensions();
        self.image = RgbaImage::from_pixel(w, h, BLANK);
        self.last_point = None;
        self.dirty = false;
    }

    /// Rasterize the current surface content to a PNG capture.
    ///
    /// This closes the capture flow; the canvas itself can be dropped
    /// afterwards.
    pub fn finish(&self) -> Result<CapturedSignature> {
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut buf, ImageOutputFormat::Png)
            .map_err(|e| Error::Image(e.to_string()))?;
        Ok(CapturedSignature {
            data: buf.into_inner(),
            format: SignatureFormat::Png,
        })
    }
}

impl Default for FreehandCanvas {
    fn default() -> Self {
        Self::new()
    }
}
