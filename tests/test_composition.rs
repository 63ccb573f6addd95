//! Compositor behavior against real document fixtures.

mod common;

use common::{contains, jpeg_bytes, minimal_pdf, png_bytes, translucent_png_bytes};
use paraph::compositor::{Compositor, WarningKind};
use paraph::geometry::{Point, Size};
use paraph::pdf::PdfFile;
use paraph::{AnnotationElement, ElementContent, SignatureFormat};

fn text_at(text: &str, x: f64, y: f64) -> AnnotationElement {
    common::init_logging();
    AnnotationElement::new(
        ElementContent::text(text).unwrap(),
        Point::new(x, y),
        Size::new(200.0, 60.0),
        "Alice",
    )
}

fn image_at(data: Vec<u8>, x: f64, y: f64) -> AnnotationElement {
    AnnotationElement::new(
        ElementContent::image(data).unwrap(),
        Point::new(x, y),
        Size::new(150.0, 75.0),
        "Alice",
    )
}

#[test]
fn output_is_a_loadable_pdf_with_original_content() {
    let compositor = Compositor::new(1.0).unwrap();
    let out = compositor
        .compose(&minimal_pdf(), 792.0, &[text_at("Approved", 50.0, 50.0)])
        .unwrap();

    let reloaded = PdfFile::load(&out.bytes).unwrap();
    let page = reloaded.page(1).unwrap();
    assert_eq!(reloaded.page_size(page).unwrap(), (612.0, 792.0));

    // The original page stream is still present, ahead of the overlay.
    assert!(contains(&out.bytes, b"q\n1 w\nQ"));
}

#[test]
fn elements_draw_in_insertion_order() {
    let compositor = Compositor::new(1.0).unwrap();
    let out = compositor
        .compose(
            &minimal_pdf(),
            792.0,
            &[text_at("first", 10.0, 10.0), text_at("second", 10.0, 100.0)],
        )
        .unwrap();

    let first = out
        .bytes
        .windows(b"(first)".len())
        .position(|w| w == b"(first)")
        .unwrap();
    let second = out
        .bytes
        .windows(b"(second)".len())
        .position(|w| w == b"(second)")
        .unwrap();
    assert!(first < second);
}

#[test]
fn recompose_of_same_inputs_is_byte_identical() {
    let compositor = Compositor::new(1.5).unwrap();
    let elements = vec![
        text_at("Approved", 30.0, 45.0),
        image_at(png_bytes(), 120.0, 240.0),
        image_at(jpeg_bytes(), 300.0, 500.0),
    ];

    let a = compositor.compose(&minimal_pdf(), 792.0, &elements).unwrap();
    let b = compositor.compose(&minimal_pdf(), 792.0, &elements).unwrap();
    assert_eq!(a.bytes, b.bytes);
}

#[test]
fn non_finite_element_is_skipped_not_fatal() {
    let compositor = Compositor::new(1.0).unwrap();
    let mut broken = text_at("Broken", 10.0, 10.0);
    broken.position.x = f64::INFINITY;

    let out = compositor
        .compose(&minimal_pdf(), 792.0, &[broken, text_at("Fine", 50.0, 50.0)])
        .unwrap();

    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].kind, WarningKind::NonFiniteGeometry);
    assert!(contains(&out.bytes, b"(Fine) Tj"));
    assert!(!contains(&out.bytes, b"(Broken) Tj"));
    PdfFile::load(&out.bytes).unwrap();
}

#[test]
fn gif_payload_is_skipped_with_warning() {
    let compositor = Compositor::new(1.0).unwrap();
    let gif = AnnotationElement::new(
        ElementContent::Image {
            data: b"GIF89a\x02\x00\x02\x00\x00".to_vec(),
            format: SignatureFormat::Png,
        },
        Point::new(10.0, 10.0),
        Size::new(100.0, 50.0),
        "Alice",
    );

    let out = compositor.compose(&minimal_pdf(), 792.0, &[gif]).unwrap();
    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].kind, WarningKind::UnsupportedImage);
    assert!(out.warnings[0].detail.contains("image/gif"));
    PdfFile::load(&out.bytes).unwrap();
}

#[test]
fn jpeg_passes_through_under_dctdecode() {
    let compositor = Compositor::new(1.0).unwrap();
    let data = jpeg_bytes();
    let out = compositor
        .compose(&minimal_pdf(), 792.0, &[image_at(data.clone(), 10.0, 10.0)])
        .unwrap();

    assert!(contains(&out.bytes, b"/DCTDecode"));
    // The original JPEG bytes are embedded unmodified.
    assert!(contains(&out.bytes, &data));
}

#[test]
fn translucent_png_gets_a_soft_mask() {
    let compositor = Compositor::new(1.0).unwrap();
    let out = compositor
        .compose(&minimal_pdf(), 792.0, &[image_at(translucent_png_bytes(), 10.0, 10.0)])
        .unwrap();
    assert!(contains(&out.bytes, b"/SMask"));
    assert!(contains(&out.bytes, b"/DeviceGray"));
}

#[test]
fn opaque_png_needs_no_soft_mask() {
    let compositor = Compositor::new(1.0).unwrap();
    let out = compositor
        .compose(&minimal_pdf(), 792.0, &[image_at(png_bytes(), 10.0, 10.0)])
        .unwrap();
    assert!(contains(&out.bytes, b"/FlateDecode"));
    assert!(!contains(&out.bytes, b"/SMask"));
}

#[test]
fn scale_two_halves_screen_coordinates() {
    let compositor = Compositor::new(2.0).unwrap();
    let out = compositor
        .compose(&minimal_pdf(), 792.0, &[text_at("Scaled", 100.0, 100.0)])
        .unwrap();
    // x = 100/2 = 50, y = 792 - 100/2 - 60/2 = 712
    assert!(contains(&out.bytes, b"50 712 Td"));
}

#[test]
fn unreadable_source_fails_before_any_output() {
    let compositor = Compositor::new(1.0).unwrap();
    assert!(compositor.compose(b"not a pdf", 792.0, &[]).is_err());
    assert!(compositor.compose(b"%PDF-1.4\n nothing here", 792.0, &[]).is_err());
}
