//! Size and format gate for uploaded images
//!
//! Nothing reaches the normalizer without passing through
//! [`UploadedImage::accept`]. Checks run cheapest first: size, then the
//! declared extension, then the magic bytes of the payload.

use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::error::{AnalysisError, Result};

/// Maximum accepted upload size (10MB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Extensions the upload control accepts
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Image formats the classifier pipeline accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Jpeg,
    Png,
}

impl UploadFormat {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Detect the format from magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            // PNG: 89 50 4E 47
            [0x89, 0x50, 0x4E, 0x47, ..] => Some(Self::Png),
            // JPEG: FF D8 FF
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

/// An upload that passed the size and format gate.
///
/// Owned by the single interaction that received it and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    filename: String,
    format: UploadFormat,
    bytes: Vec<u8>,
}

impl UploadedImage {
    /// Run the upload gate over a named payload
    pub fn accept(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let filename = filename.into();

        check_size(bytes.len())?;

        if bytes.is_empty() {
            return Err(AnalysisError::MissingImage);
        }

        let declared = Path::new(&filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(UploadFormat::from_extension)
            .ok_or_else(|| {
                AnalysisError::UnsupportedFormat(format!(
                    "'{}' is not one of {}",
                    filename,
                    ALLOWED_EXTENSIONS.join(", ")
                ))
            })?;

        let sniffed = UploadFormat::sniff(&bytes).ok_or_else(|| {
            AnalysisError::UnsupportedFormat(format!(
                "'{}' does not contain JPEG or PNG data",
                filename
            ))
        })?;

        if sniffed != declared {
            tracing::debug!(
                filename = %filename,
                declared = declared.mime_type(),
                detected = sniffed.mime_type(),
                "Extension does not match content, using detected format"
            );
        }

        Ok(Self {
            filename,
            format: sniffed,
            bytes,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn format(&self) -> UploadFormat {
        self.format
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Decode the payload into pixels
    pub fn decode(&self) -> Result<DynamicImage> {
        image::load_from_memory_with_format(&self.bytes, self.format.image_format())
            .map_err(|e| AnalysisError::normalization(format!("{}: {}", self.filename, e)))
    }
}

/// Reject a payload whose size is over [`MAX_UPLOAD_BYTES`]
pub fn check_size(size: usize) -> Result<()> {
    if size > MAX_UPLOAD_BYTES {
        return Err(AnalysisError::OversizeInput {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use std::io::Cursor;

    pub(crate) fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 90])
        });
        encode(&DynamicImage::ImageRgb8(img), ImageFormat::Png)
    }

    #[test]
    fn test_accept_png() {
        let upload = UploadedImage::accept("scan.png", png_bytes(8, 6)).unwrap();
        assert_eq!(upload.format(), UploadFormat::Png);
        assert_eq!(upload.filename(), "scan.png");

        let img = upload.decode().unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));
    }

    #[test]
    fn test_accept_jpeg_uppercase_extension() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([120])));
        let bytes = encode(&img, ImageFormat::Jpeg);

        let upload = UploadedImage::accept("SCAN.JPEG", bytes).unwrap();
        assert_eq!(upload.format(), UploadFormat::Jpeg);
        assert!(upload.decode().is_ok());
    }

    #[test]
    fn test_rejects_one_byte_over_limit() {
        let bytes = vec![0u8; MAX_UPLOAD_BYTES + 1];
        assert_eq!(bytes.len(), 10_485_761);

        let err = UploadedImage::accept("scan.png", bytes).unwrap_err();
        assert!(matches!(err, AnalysisError::OversizeInput { size: 10_485_761, .. }));
    }

    #[test]
    fn test_exact_limit_passes_size_check() {
        assert!(check_size(MAX_UPLOAD_BYTES).is_ok());
        assert!(check_size(MAX_UPLOAD_BYTES + 1).is_err());
    }

    #[test]
    fn test_rejects_bmp_extension() {
        let err = UploadedImage::accept("scan.bmp", png_bytes(2, 2)).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_rejects_missing_extension() {
        let err = UploadedImage::accept("scan", png_bytes(2, 2)).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_rejects_non_image_content() {
        let err = UploadedImage::accept("scan.png", b"GIF89a-not-allowed".to_vec()).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_rejects_empty_upload() {
        let err = UploadedImage::accept("scan.png", Vec::new()).unwrap_err();
        assert_eq!(err, AnalysisError::MissingImage);
    }

    #[test]
    fn test_corrupted_png_fails_decode() {
        let bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x00, 0x00, 0x00, 0x00];
        let upload = UploadedImage::accept("scan.png", bytes).unwrap();
        assert!(matches!(
            upload.decode().unwrap_err(),
            AnalysisError::Normalization(_)
        ));
    }

    #[test]
    fn test_sniff() {
        assert_eq!(
            UploadFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(UploadFormat::Jpeg)
        );
        assert_eq!(
            UploadFormat::sniff(&[0x89, 0x50, 0x4E, 0x47, 0x0D]),
            Some(UploadFormat::Png)
        );
        assert_eq!(UploadFormat::sniff(&[0x42, 0x4D, 0x00, 0x00]), None);
        assert_eq!(UploadFormat::sniff(&[0xFF]), None);
    }
}
