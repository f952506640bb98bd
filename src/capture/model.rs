use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::error::{CaptureError, ErrorDetails};

/// An image serialized into a file format, ready to be stored or sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

impl EncodedImage {
    /// Serializes `image` as `format`
    ///
    /// JPEG has no alpha channel, so images with alpha are flattened to RGB first.
    pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Self, CaptureError> {
        let flattened;
        let source = if format == ImageFormat::Jpeg && image.color().has_alpha() {
            flattened = DynamicImage::ImageRgb8(image.to_rgb8());
            &flattened
        } else {
            image
        };

        let mut data = Vec::new();
        source.write_to(&mut Cursor::new(&mut data), format).map_err(|e| {
            CaptureError::failure(
                format!("Failed to encode the captured image: {}", e),
                ErrorDetails::new()
                    .with("format", format!("{:?}", format))
                    .with("width", image.width())
                    .with("height", image.height()),
            )
        })?;

        Ok(Self { format, data })
    }

    /// Base64 text of the encoded bytes
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    /// Canonical file extension, without the dot
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

/// What a page capture produced
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureResult {
    /// Viewport-only or full-page single shot
    Single(DynamicImage),
    /// Tiles in capture order, top to bottom or left to right
    Sequence(Vec<DynamicImage>),
}

impl CaptureResult {
    pub fn len(&self) -> usize {
        match self {
            CaptureResult::Single(_) => 1,
            CaptureResult::Sequence(images) => images.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn images(&self) -> Vec<&DynamicImage> {
        match self {
            CaptureResult::Single(image) => vec![image],
            CaptureResult::Sequence(images) => images.iter().collect(),
        }
    }

    pub fn into_images(self) -> Vec<DynamicImage> {
        match self {
            CaptureResult::Single(image) => vec![image],
            CaptureResult::Sequence(images) => images,
        }
    }

    pub fn single(&self) -> Option<&DynamicImage> {
        match self {
            CaptureResult::Single(image) => Some(image),
            CaptureResult::Sequence(_) => None,
        }
    }

    /// Encodes every image, preserving capture order
    pub fn encode(&self, format: ImageFormat) -> Result<Vec<EncodedImage>, CaptureError> {
        self.images()
            .into_iter()
            .map(|image| EncodedImage::encode(image, format))
            .collect()
    }
}
