//! Uploaded signature images.
//!
//! An uploaded file is emitted as-is, without re-rasterization, after two
//! checks: the magic bytes must identify a supported format (PNG or
//! JPEG), and the payload must actually decode. A file that fails either
//! check surfaces an error and emits nothing.

use crate::elements::SignatureFormat;
use crate::error::{Error, Result};
use crate::signature::CapturedSignature;

/// Accept uploaded image bytes as a signature capture.
pub fn from_bytes(data: Vec<u8>) -> Result<CapturedSignature> {
    let format = SignatureFormat::detect(&data)?;
    // The magic bytes alone do not prove the payload is intact; a
    // truncated file would otherwise fail later, mid-composition.
    image::load_from_memory(&data).map_err(|e| Error::UnreadableImage(e.to_string()))?;
    Ok(CapturedSignature { data, format })
}

/// Read an image file from disk and accept it as a signature capture.
pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<CapturedSignature> {
    let data = std::fs::read(path.as_ref())?;
    from_bytes(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba, RgbaImage};

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_valid_png_passes_through_unchanged() {
        let data = png_bytes();
        let capture = from_bytes(data.clone()).unwrap();
        assert_eq!(capture.format, SignatureFormat::Png);
        assert_eq!(capture.data, data);
    }

    #[test]
    fn test_gif_rejected() {
        let result = from_bytes(b"GIF89a\x00\x00\x00".to_vec());
        assert!(matches!(result, Err(Error::UnsupportedImageFormat(_))));
    }

    #[test]
    fn test_truncated_png_rejected() {
        let mut data = png_bytes();
        data.truncate(12);
        let result = from_bytes(data);
        assert!(matches!(result, Err(Error::UnreadableImage(_))));
    }

    #[test]
    fn test_from_file_reads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signature.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let capture = from_file(&path).unwrap();
        assert_eq!(capture.format, SignatureFormat::Png);
        assert_eq!(capture.data, png_bytes());
    }

    #[test]
    fn test_from_file_missing_surfaces_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = from_file(dir.path().join("absent.png"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_from_file_wrong_format_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signature.gif");
        std::fs::write(&path, b"GIF89a\x00\x00\x00").unwrap();
        let result = from_file(&path);
        assert!(matches!(result, Err(Error::UnsupportedImageFormat(_))));
    }
}
