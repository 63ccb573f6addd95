//! Baking annotation elements into the output document.
//!
//! The compositor loads the original PDF, converts every element's screen
//! frame to page space, and appends one content stream to the first page
//! that draws all of them: text with the built-in Helvetica font, images
//! as XObjects. The source document's own objects pass through untouched,
//! so everything the original page showed is still there underneath the
//! annotations.
//!
//! Per-element failures never abort the export. An element with a
//! non-finite frame, an undecodable image, or an unsupported format is
//! skipped and reported in [`ComposedDocument::warnings`]; the remaining
//! elements still make it into the output. Only document-level failures
//! (unreadable source PDF, no pages) surface as errors.
//!
//! Output is deterministic: composing the same source bytes with the same
//! element list yields byte-identical output.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::GenericImageView;

use crate::elements::{AnnotationElement, ElementContent, ElementId, SignatureFormat};
use crate::error::{Error, Result};
use crate::geometry::{PageMetrics, Rect};
use crate::pdf::object::Dictionary;
use crate::pdf::{Object, ObjectRef, ObjectSerializer, PdfFile};

/// Font size used for all baked text elements, in points.
pub const TEXT_FONT_SIZE: f64 = 14.0;

/// Resource name of the text font in the appended content stream.
const TEXT_FONT_RESOURCE: &str = "F1";

/// Why an element was left out of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Position or size contained NaN or infinity
    NonFiniteGeometry,
    /// Image bytes are not PNG or JPEG
    UnsupportedImage,
    /// Image bytes claimed a supported format but failed to decode
    EmbedFailed,
}

/// Record of one element skipped during composition.
#[derive(Debug, Clone)]
pub struct CompositionWarning {
    /// The skipped element
    pub element: ElementId,
    /// Skip reason
    pub kind: WarningKind,
    /// Human-readable detail for logs and panels
    pub detail: String,
}

/// A finished export: the output document plus skip warnings.
#[derive(Debug)]
pub struct ComposedDocument {
    /// Complete PDF bytes
    pub bytes: Vec<u8>,
    /// Elements that were skipped, in element order
    pub warnings: Vec<CompositionWarning>,
}

/// Bakes an element list into a source PDF.
#[derive(Debug, Clone)]
pub struct Compositor {
    render_scale: f64,
}

impl Compositor {
    /// Create a compositor for elements captured at the given render
    /// scale (screen pixels per PDF point).
    pub fn new(render_scale: f64) -> Result<Self> {
        if !render_scale.is_finite() || render_scale <= 0.0 {
            return Err(Error::Composition(format!(
                "render scale must be finite and positive, got {}",
                render_scale
            )));
        }
        Ok(Self { render_scale })
    }

    /// The render scale this compositor divides out.
    pub fn render_scale(&self) -> f64 {
        self.render_scale
    }

    /// Bake `elements` onto the first page of `original`.
    ///
    /// `page_height` is the page height in PDF points as seen by the
    /// overlay; it anchors the Y-axis flip. On success the returned
    /// [`ComposedDocument`] holds a complete, standalone PDF.
    pub fn compose(
        &self,
        original: &[u8],
        page_height: f64,
        elements: &[AnnotationElement],
    ) -> Result<ComposedDocument> {
        if !page_height.is_finite() || page_height <= 0.0 {
            return Err(Error::Composition(format!(
                "page height must be finite and positive, got {}",
                page_height
            )));
        }

        let mut file = PdfFile::load(original)?;
        let page_ref = file.page(1)?;
        let (page_width, _) = file.page_size(page_ref)?;
        let metrics = PageMetrics::new(page_width, page_height, self.render_scale);

        let mut warnings = Vec::new();
        let mut ops: Vec<u8> = Vec::new();
        let mut xobjects: Vec<(String, ObjectRef)> = Vec::new();
        let mut text_drawn = false;

        for element in elements {
            if !element.has_finite_frame() {
                log::warn!("element {} has a non-finite frame, skipping", element.id);
                warnings.push(CompositionWarning {
                    element: element.id,
                    kind: WarningKind::NonFiniteGeometry,
                    detail: "position or size is not a finite number".to_string(),
                });
                continue;
            }

            let frame = metrics.to_page_space(Rect::from_parts(element.position, element.size));

            match &element.content {
                ElementContent::Text(text) => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    write_text_op(&mut ops, text, frame);
                    text_drawn = true;
                },
                ElementContent::Image { data, .. } => match embed_image(&mut file, data) {
                    Ok(image_ref) => {
                        let name = format!("Sig{}", xobjects.len());
                        write_image_op(&mut ops, &name, frame);
                        xobjects.push((name, image_ref));
                    },
                    Err(Error::UnsupportedImageFormat(label)) => {
                        log::warn!("element {} has unsupported image ({}), skipping", element.id, label);
                        warnings.push(CompositionWarning {
                            element: element.id,
                            kind: WarningKind::UnsupportedImage,
                            detail: format!("unsupported image format: {}", label),
                        });
                    },
                    Err(e) => {
                        log::warn!("element {} image failed to embed: {}", element.id, e);
                        warnings.push(CompositionWarning {
                            element: element.id,
                            kind: WarningKind::EmbedFailed,
                            detail: e.to_string(),
                        });
                    },
                },
            }
        }

        if !ops.is_empty() {
            let font_ref = text_drawn.then(|| {
                file.add_object(ObjectSerializer::dict(vec![
                    ("Type", ObjectSerializer::name("Font")),
                    ("Subtype", ObjectSerializer::name("Type1")),
                    ("BaseFont", ObjectSerializer::name("Helvetica")),
                ]))
            });
            self.attach_to_page(&mut file, page_ref, ops, &xobjects, font_ref)?;
        }

        Ok(ComposedDocument {
            bytes: file.save()?,
            warnings,
        })
    }

    /// Append the drawing ops to the page and register the resources
    /// they reference.
    fn attach_to_page(
        &self,
        file: &mut PdfFile,
        page_ref: ObjectRef,
        ops: Vec<u8>,
        xobjects: &[(String, ObjectRef)],
        font_ref: Option<ObjectRef>,
    ) -> Result<()> {
        let page_dict = file
            .get(page_ref)
            .and_then(|o| o.as_dict())
            .ok_or_else(|| Error::InvalidPdf("page is not a dictionary".to_string()))?;

        // Resources may live behind a reference; materialize a direct
        // dictionary on the page so the new entries are visible.
        let mut resources = match page_dict.get("Resources") {
            Some(r) => file
                .resolve(r)?
                .as_dict()
                .cloned()
                .ok_or_else(|| Error::InvalidPdf("Resources is not a dictionary".to_string()))?,
            None => Dictionary::new(),
        };

        if !xobjects.is_empty() {
            let mut xobject_dict = match resources.get("XObject") {
                Some(x) => file
                    .resolve(x)?
                    .as_dict()
                    .cloned()
                    .ok_or_else(|| Error::InvalidPdf("XObject is not a dictionary".to_string()))?,
                None => Dictionary::new(),
            };
            for (name, image_ref) in xobjects {
                xobject_dict.insert(name.clone(), Object::Reference(*image_ref));
            }
            resources.insert("XObject".to_string(), Object::Dictionary(xobject_dict));
        }

        if let Some(font_ref) = font_ref {
            let mut font_dict = match resources.get("Font") {
                Some(f) => file
                    .resolve(f)?
                    .as_dict()
                    .cloned()
                    .ok_or_else(|| Error::InvalidPdf("Font is not a dictionary".to_string()))?,
                None => Dictionary::new(),
            };
            font_dict.insert(TEXT_FONT_RESOURCE.to_string(), Object::Reference(font_ref));
            resources.insert("Font".to_string(), Object::Dictionary(font_dict));
        }

        let existing_contents = page_dict.get("Contents").cloned();

        let ops_ref = file.add_object(Object::Stream {
            dict: Dictionary::new(),
            data: bytes::Bytes::from(ops),
        });

        // The existing content stays first so annotations draw on top.
        let new_contents = match existing_contents {
            Some(Object::Reference(r)) => {
                Object::Array(vec![Object::Reference(r), Object::Reference(ops_ref)])
            },
            Some(Object::Array(mut arr)) => {
                arr.push(Object::Reference(ops_ref));
                Object::Array(arr)
            },
            _ => Object::Reference(ops_ref),
        };

        let page = file
            .get_mut(page_ref)
            .and_then(|o| o.as_dict_mut())
            .ok_or_else(|| Error::InvalidPdf("page is not a dictionary".to_string()))?;
        page.insert("Resources".to_string(), Object::Dictionary(resources));
        page.insert("Contents".to_string(), new_contents);
        Ok(())
    }
}

/// Write a text-drawing block at the frame's bottom-left corner.
fn write_text_op(ops: &mut Vec<u8>, text: &str, frame: Rect) {
    ops.extend_from_slice(b"BT\n");
    ops.extend_from_slice(format!("/{} {} Tf\n", TEXT_FONT_RESOURCE, fmt_coord(TEXT_FONT_SIZE)).as_bytes());
    ops.extend_from_slice(b"0 0 0 rg\n");
    ops.extend_from_slice(format!("{} {} Td\n", fmt_coord(frame.x), fmt_coord(frame.y)).as_bytes());
    ops.extend_from_slice(b"(");
    for byte in text.bytes() {
        match byte {
            b'(' => ops.extend_from_slice(b"\\("),
            b')' => ops.extend_from_slice(b"\\)"),
            b'\\' => ops.extend_from_slice(b"\\\\"),
            b'\n' => ops.extend_from_slice(b"\\n"),
            b'\r' => ops.extend_from_slice(b"\\r"),
            _ => ops.push(byte),
        }
    }
    ops.extend_from_slice(b") Tj\nET\n");
}

/// Write an image placement block scaling the unit square to the frame.
fn write_image_op(ops: &mut Vec<u8>, name: &str, frame: Rect) {
    ops.extend_from_slice(b"q\n");
    ops.extend_from_slice(
        format!(
            "{} 0 0 {} {} {} cm\n",
            fmt_coord(frame.width),
            fmt_coord(frame.height),
            fmt_coord(frame.x),
            fmt_coord(frame.y)
        )
        .as_bytes(),
    );
    ops.extend_from_slice(format!("/{} Do\n", name).as_bytes());
    ops.extend_from_slice(b"Q\n");
}

/// Format a coordinate for a content stream, trimming trailing zeros.
fn fmt_coord(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.4}", value);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Add an image XObject to the document and return its reference.
///
/// JPEG data passes through unchanged under DCTDecode. PNG data is
/// decoded, the color channels re-compressed with zlib, and any alpha
/// channel split into a DeviceGray SMask so transparency survives.
fn embed_image(file: &mut PdfFile, data: &[u8]) -> Result<ObjectRef> {
    let format = SignatureFormat::detect(data)?;
    let img = image::load_from_memory(data).map_err(|e| Error::UnreadableImage(e.to_string()))?;
    let (width, height) = img.dimensions();

    match format {
        SignatureFormat::Jpeg => {
            let color_space = match img.color() {
                image::ColorType::L8 | image::ColorType::La8 => "DeviceGray",
                _ => "DeviceRGB",
            };
            let mut dict = Dictionary::new();
            dict.insert("Type".to_string(), ObjectSerializer::name("XObject"));
            dict.insert("Subtype".to_string(), ObjectSerializer::name("Image"));
            dict.insert("Width".to_string(), ObjectSerializer::integer(width as i64));
            dict.insert("Height".to_string(), ObjectSerializer::integer(height as i64));
            dict.insert("ColorSpace".to_string(), ObjectSerializer::name(color_space));
            dict.insert("BitsPerComponent".to_string(), ObjectSerializer::integer(8));
            dict.insert("Filter".to_string(), ObjectSerializer::name("DCTDecode"));
            Ok(file.add_object(Object::Stream {
                dict,
                data: bytes::Bytes::copy_from_slice(data),
            }))
        },
        SignatureFormat::Png => {
            let rgba = img.to_rgba8();
            let pixel_count = width as usize * height as usize;
            let mut rgb = Vec::with_capacity(pixel_count * 3);
            let mut alpha = Vec::with_capacity(pixel_count);
            for pixel in rgba.pixels() {
                rgb.extend_from_slice(&pixel.0[..3]);
                alpha.push(pixel.0[3]);
            }

            let smask_ref = if alpha.iter().any(|&a| a != 255) {
                let mut smask_dict = Dictionary::new();
                smask_dict.insert("Type".to_string(), ObjectSerializer::name("XObject"));
                smask_dict.insert("Subtype".to_string(), ObjectSerializer::name("Image"));
                smask_dict.insert("Width".to_string(), ObjectSerializer::integer(width as i64));
                smask_dict.insert("Height".to_string(), ObjectSerializer::integer(height as i64));
                smask_dict.insert("ColorSpace".to_string(), ObjectSerializer::name("DeviceGray"));
                smask_dict.insert("BitsPerComponent".to_string(), ObjectSerializer::integer(8));
                smask_dict.insert("Filter".to_string(), ObjectSerializer::name("FlateDecode"));
                Some(file.add_object(Object::Stream {
                    dict: smask_dict,
                    data: bytes::Bytes::from(deflate(&alpha)?),
                }))
            } else {
                None
            };

            let mut dict = Dictionary::new();
            dict.insert("Type".to_string(), ObjectSerializer::name("XObject"));
            dict.insert("Subtype".to_string(), ObjectSerializer::name("Image"));
            dict.insert("Width".to_string(), ObjectSerializer::integer(width as i64));
            dict.insert("Height".to_string(), ObjectSerializer::integer(height as i64));
            dict.insert("ColorSpace".to_string(), ObjectSerializer::name("DeviceRGB"));
            dict.insert("BitsPerComponent".to_string(), ObjectSerializer::integer(8));
            dict.insert("Filter".to_string(), ObjectSerializer::name("FlateDecode"));
            if let Some(smask) = smask_ref {
                dict.insert("SMask".to_string(), Object::Reference(smask));
            }
            Ok(file.add_object(Object::Stream {
                dict,
                data: bytes::Bytes::from(deflate(&rgb)?),
            }))
        },
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::AnnotationElement;
    use crate::geometry::{Point, Size};
    use crate::pdf::document::tests::minimal_pdf;
    use std::io::Cursor;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn text_element(text: &str, x: f64, y: f64, w: f64, h: f64) -> AnnotationElement {
        AnnotationElement::new(
            ElementContent::text(text).unwrap(),
            Point::new(x, y),
            Size::new(w, h),
            "Alice",
        )
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 128]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    fn jpeg_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Jpeg(90))
            .unwrap();
        buf
    }

    #[test]
    fn test_rejects_bad_scale() {
        assert!(Compositor::new(0.0).is_err());
        assert!(Compositor::new(f64::NAN).is_err());
        assert!(Compositor::new(1.5).is_ok());
    }

    #[test]
    fn test_text_lands_at_flipped_position() {
        let compositor = Compositor::new(1.0).unwrap();
        let out = compositor
            .compose(&minimal_pdf(), 792.0, &[text_element("Approved", 50.0, 50.0, 200.0, 60.0)])
            .unwrap();

        assert!(out.warnings.is_empty());
        // 792 - 50 - 60 = 682
        assert!(contains(&out.bytes, b"50 682 Td"));
        assert!(contains(&out.bytes, b"/F1 14 Tf"));
        assert!(contains(&out.bytes, b"(Approved) Tj"));
    }

    #[test]
    fn test_render_scale_divided_out() {
        let compositor = Compositor::new(2.0).unwrap();
        let out = compositor
            .compose(&minimal_pdf(), 792.0, &[text_element("Hi", 100.0, 100.0, 200.0, 80.0)])
            .unwrap();
        // x = 100/2 = 50, y = 792 - 50 - 40 = 702
        assert!(contains(&out.bytes, b"50 702 Td"));
    }

    #[test]
    fn test_non_finite_frame_skipped_with_warning() {
        let compositor = Compositor::new(1.0).unwrap();
        let mut bad = text_element("Broken", 10.0, 10.0, 200.0, 60.0);
        bad.size.width = f64::NAN;
        let good = text_element("Fine", 50.0, 50.0, 200.0, 60.0);

        let out = compositor
            .compose(&minimal_pdf(), 792.0, &[bad.clone(), good])
            .unwrap();

        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].element, bad.id);
        assert_eq!(out.warnings[0].kind, WarningKind::NonFiniteGeometry);
        assert!(!contains(&out.bytes, b"(Broken) Tj"));
        assert!(contains(&out.bytes, b"(Fine) Tj"));
    }

    #[test]
    fn test_text_escaping() {
        let compositor = Compositor::new(1.0).unwrap();
        let out = compositor
            .compose(&minimal_pdf(), 792.0, &[text_element("a (b) c", 0.0, 0.0, 200.0, 60.0)])
            .unwrap();
        assert!(contains(&out.bytes, b"(a \\(b\\) c) Tj"));
    }

    #[test]
    fn test_png_and_jpeg_embed() {
        let compositor = Compositor::new(1.0).unwrap();
        let elements = vec![
            AnnotationElement::new(
                ElementContent::image(png_bytes()).unwrap(),
                Point::new(10.0, 10.0),
                Size::new(100.0, 50.0),
                "Alice",
            ),
            AnnotationElement::new(
                ElementContent::image(jpeg_bytes()).unwrap(),
                Point::new(10.0, 200.0),
                Size::new(100.0, 50.0),
                "Alice",
            ),
        ];
        let out = compositor.compose(&minimal_pdf(), 792.0, &elements).unwrap();

        assert!(out.warnings.is_empty());
        assert!(contains(&out.bytes, b"/Sig0 Do"));
        assert!(contains(&out.bytes, b"/Sig1 Do"));
        assert!(contains(&out.bytes, b"/FlateDecode"));
        assert!(contains(&out.bytes, b"/DCTDecode"));
        // Half-transparent PNG gets a soft mask.
        assert!(contains(&out.bytes, b"/SMask"));
    }

    #[test]
    fn test_unsupported_image_bytes_warned_not_fatal() {
        let compositor = Compositor::new(1.0).unwrap();
        // Mislabeled content built from raw parts; compose re-checks the
        // actual bytes.
        let gif = AnnotationElement::new(
            ElementContent::Image {
                data: b"GIF89a\x01\x00\x01\x00".to_vec(),
                format: SignatureFormat::Png,
            },
            Point::new(10.0, 10.0),
            Size::new(100.0, 50.0),
            "Alice",
        );
        let good = text_element("Still here", 50.0, 50.0, 200.0, 60.0);

        let out = compositor.compose(&minimal_pdf(), 792.0, &[gif, good]).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, WarningKind::UnsupportedImage);
        assert!(out.warnings[0].detail.contains("image/gif"));
        assert!(contains(&out.bytes, b"(Still here) Tj"));
    }

    #[test]
    fn test_truncated_png_warned_as_embed_failure() {
        let compositor = Compositor::new(1.0).unwrap();
        let mut data = png_bytes();
        data.truncate(12);
        let broken = AnnotationElement::new(
            ElementContent::Image {
                data,
                format: SignatureFormat::Png,
            },
            Point::new(10.0, 10.0),
            Size::new(100.0, 50.0),
            "Alice",
        );
        let out = compositor.compose(&minimal_pdf(), 792.0, &[broken]).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, WarningKind::EmbedFailed);
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let compositor = Compositor::new(1.0).unwrap();
        let mut el = text_element("x", 50.0, 50.0, 200.0, 60.0);
        el.content = ElementContent::Text("   ".to_string());
        let out = compositor.compose(&minimal_pdf(), 792.0, &[el]).unwrap();
        assert!(out.warnings.is_empty());
        assert!(!contains(&out.bytes, b"Tj"));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let compositor = Compositor::new(1.0).unwrap();
        let elements = vec![
            text_element("Approved", 50.0, 50.0, 200.0, 60.0),
            AnnotationElement::new(
                ElementContent::image(png_bytes()).unwrap(),
                Point::new(10.0, 10.0),
                Size::new(100.0, 50.0),
                "Alice",
            ),
        ];
        let a = compositor.compose(&minimal_pdf(), 792.0, &elements).unwrap();
        let b = compositor.compose(&minimal_pdf(), 792.0, &elements).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn test_no_elements_still_valid_output() {
        let compositor = Compositor::new(1.0).unwrap();
        let out = compositor.compose(&minimal_pdf(), 792.0, &[]).unwrap();
        assert!(out.warnings.is_empty());
        let reloaded = PdfFile::load(&out.bytes).unwrap();
        assert_eq!(reloaded.pages().unwrap().len(), 1);
    }

    #[test]
    fn test_output_reloads_with_appended_contents() {
        let compositor = Compositor::new(1.0).unwrap();
        let out = compositor
            .compose(&minimal_pdf(), 792.0, &[text_element("Approved", 50.0, 50.0, 200.0, 60.0)])
            .unwrap();

        let reloaded = PdfFile::load(&out.bytes).unwrap();
        let page = reloaded.page(1).unwrap();
        let page_dict = reloaded.get(page).unwrap().as_dict().unwrap();
        // Original stream plus the annotation stream.
        let contents = page_dict.get("Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 2);
    }
}
