//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::Cursor;

/// Initialize logging for a test; repeated calls are harmless.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assemble a minimal one-page letter-size PDF with a correct xref table.
pub fn minimal_pdf() -> Vec<u8> {
    build_pdf(&[[0.0, 0.0, 612.0, 792.0]])
}

/// Assemble a three-page PDF with per-page MediaBoxes.
pub fn three_page_pdf() -> Vec<u8> {
    build_pdf(&[
        [0.0, 0.0, 612.0, 792.0],
        [0.0, 0.0, 612.0, 792.0],
        [0.0, 0.0, 595.0, 842.0],
    ])
}

fn build_pdf(media_boxes: &[[f64; 4]]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let page_count = media_boxes.len();
    let first_page_id = 3;
    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", first_page_id + i * 2))
        .collect();

    let mut bodies: Vec<String> = vec![
        "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_string(),
        format!(
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids.join(" "),
            page_count
        ),
    ];
    for (i, mb) in media_boxes.iter().enumerate() {
        let page_id = first_page_id + i * 2;
        let content_id = page_id + 1;
        bodies.push(format!(
            "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [{} {} {} {}] /Contents {} 0 R >>\nendobj\n",
            page_id, mb[0], mb[1], mb[2], mb[3], content_id
        ));
        bodies.push(format!(
            "{} 0 obj\n<< /Length 8 >>\nstream\nq\n1 w\nQ\nendstream\nendobj\n",
            content_id
        ));
    }

    let mut offsets = Vec::new();
    for body in &bodies {
        offsets.push(out.len());
        out.extend_from_slice(body.as_bytes());
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", bodies.len() + 1).as_bytes());
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(format!("trailer\n<< /Size {} /Root 1 0 R >>\n", bodies.len() + 1).as_bytes());
    out.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_start).as_bytes());
    out
}

/// Byte-level substring check.
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// A small opaque PNG.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]));
    encode_png(img)
}

/// A small PNG with partial transparency.
pub fn translucent_png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 96]));
    encode_png(img)
}

fn encode_png(img: image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .expect("in-memory PNG encode");
    buf
}

/// A small JPEG.
pub fn jpeg_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([40, 40, 40]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Jpeg(90))
        .expect("in-memory JPEG encode");
    buf
}
