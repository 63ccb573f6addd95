//! Typed signature rendering.
//!
//! The user types their name and picks one of a small fixed set of
//! cursive styles; the styled text is rendered off-screen through the
//! style's TrueType font and exactly that region is rasterized to a PNG.
//!
//! Font files are not bundled: the embedding application registers the
//! bytes for each style it offers.

use image::{ImageOutputFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use rusttype::{point, Font, Scale};
use std::collections::HashMap;

use crate::elements::SignatureFormat;
use crate::error::{Error, Result};
use crate::signature::CapturedSignature;

/// Font pixel height used for the rendered signature.
const FONT_HEIGHT: f32 = 40.0;

/// Horizontal padding around the rendered text, in pixels.
const PADDING: u32 = 8;

/// The fixed set of cursive display styles offered for typed signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureStyle {
    /// Pacifico
    Pacifico,
    /// Great Vibes
    GreatVibes,
    /// Dancing Script
    DancingScript,
}

impl SignatureStyle {
    /// All styles, in menu order.
    pub const ALL: [SignatureStyle; 3] = [
        SignatureStyle::Pacifico,
        SignatureStyle::GreatVibes,
        SignatureStyle::DancingScript,
    ];

    /// Human-readable style name for selection menus.
    pub fn display_name(&self) -> &'static str {
        match self {
            SignatureStyle::Pacifico => "Pacifico",
            SignatureStyle::GreatVibes => "Great Vibes",
            SignatureStyle::DancingScript => "Dancing Script",
        }
    }
}

/// Registry of the TrueType fonts backing each signature style.
#[derive(Default)]
pub struct FontCatalog {
    fonts: HashMap<SignatureStyle, Font<'static>>,
}

impl FontCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the font bytes for a style.
    ///
    /// Fails if the bytes are not a parseable TrueType/OpenType font.
    pub fn register(&mut self, style: SignatureStyle, font_data: Vec<u8>) -> Result<()> {
        let font = Font::try_from_vec(font_data)
            .ok_or_else(|| Error::Font(format!("invalid font data for {}", style.display_name())))?;
        self.fonts.insert(style, font);
        Ok(())
    }

    /// Whether a style has a registered font.
    pub fn has_style(&self, style: SignatureStyle) -> bool {
        self.fonts.contains_key(&style)
    }

    /// Render typed text in a style and rasterize it to a PNG capture.
    ///
    /// Returns `Ok(None)` for empty or whitespace-only text: saving an
    /// empty typed signature is a no-op, not an error. Fails if the style
    /// has no registered font.
    pub fn render(&self, text: &str, style: SignatureStyle) -> Result<Option<CapturedSignature>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let font = self.fonts.get(&style).ok_or_else(|| {
            Error::Font(format!("no font registered for {}", style.display_name()))
        })?;

        let scale = Scale::uniform(FONT_HEIGHT);
        let v_metrics = font.v_metrics(scale);
        let glyphs: Vec<_> = font
            .layout(text, scale, point(0.0, v_metrics.ascent))
            .collect();

        // Tight horizontal extent of the laid-out glyphs.
        let text_width = glyphs
            .iter()
            .filter_map(|g| g.pixel_bounding_box().map(|bb| bb.max.x))
            .max()
            .unwrap_or(0)
            .max(1) as u32;
        let text_height = (v_metrics.ascent - v_metrics.descent).ceil().max(1.0) as u32;

        let width = text_width + PADDING * 2;
        let height = text_height + PADDING * 2;

        // White background so the capture reads as paper, not as a cutout.
        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        draw_text_mut(
            &mut image,
            Rgba([0, 0, 0, 255]),
            PADDING as i32,
            PADDING as i32,
            scale,
            font,
            text,
        );

        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .map_err(|e| Error::Image(e.to_string()))?;

        Ok(Some(CapturedSignature {
            data: buf.into_inner(),
            format: SignatureFormat::Png,
        }))
    }
}

impl std::fmt::Debug for FontCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let styles: Vec<&str> = self.fonts.keys().map(|s| s.display_name()).collect();
        f.debug_struct("FontCatalog").field("styles", &styles).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_names() {
        assert_eq!(SignatureStyle::Pacifico.display_name(), "Pacifico");
        assert_eq!(SignatureStyle::ALL.len(), 3);
    }

    #[test]
    fn test_empty_text_is_noop() {
        let catalog = FontCatalog::new();
        assert!(catalog.render("", SignatureStyle::Pacifico).unwrap().is_none());
        assert!(catalog.render("   ", SignatureStyle::Pacifico).unwrap().is_none());
    }

    #[test]
    fn test_unregistered_style_fails() {
        let catalog = FontCatalog::new();
        let result = catalog.render("Alice", SignatureStyle::GreatVibes);
        assert!(matches!(result, Err(Error::Font(_))));
    }

    #[test]
    fn test_garbage_font_rejected() {
        let mut catalog = FontCatalog::new();
        let result = catalog.register(SignatureStyle::Pacifico, vec![0u8; 16]);
        assert!(matches!(result, Err(Error::Font(_))));
        assert!(!catalog.has_style(SignatureStyle::Pacifico));
    }
}
