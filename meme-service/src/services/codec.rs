//! Base64 and raster image helpers used before every gateway call.

use crate::error::EncodingError;
use base64::{engine::general_purpose, Engine as _};
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::io::Cursor;

/// Outbound encoding for images sent to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFormat {
    /// Lossy, used for vision analysis payloads.
    Jpeg,
    /// Lossless, required by the variations endpoint.
    Png,
}

impl TransportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            TransportFormat::Jpeg => "image/jpeg",
            TransportFormat::Png => "image/png",
        }
    }
}

/// Decode standard (padded) base64.
///
/// Surrounding whitespace and a `data:<mime>;base64,` prefix are accepted; any other
/// non-alphabet character is an error.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, EncodingError> {
    let trimmed = input.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .ok_or_else(|| EncodingError::InvalidEncoding("Malformed data URL".to_string()))?,
        None => trimmed,
    };

    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| EncodingError::InvalidEncoding(e.to_string()))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Parse bytes as any supported raster format.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, EncodingError> {
    if bytes.is_empty() {
        return Err(EncodingError::InvalidImage("Image data is empty".to_string()));
    }

    image::load_from_memory(bytes).map_err(|e| EncodingError::InvalidImage(e.to_string()))
}

/// Resize to a `target_size` square, ignoring aspect ratio.
pub fn normalize(image: &DynamicImage, target_size: u32) -> DynamicImage {
    image.resize_exact(target_size, target_size, FilterType::Triangle)
}

pub fn encode_image(image: &DynamicImage, format: TransportFormat) -> Result<Vec<u8>, EncodingError> {
    let mut buffer = Cursor::new(Vec::new());

    let result = match format {
        // JPEG has no alpha channel.
        TransportFormat::Jpeg => {
            DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut buffer, ImageFormat::Jpeg)
        }
        TransportFormat::Png => image.write_to(&mut buffer, ImageFormat::Png),
    };

    result.map_err(|e| EncodingError::InvalidImage(format!("Failed to encode image: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Decode, normalize and re-encode raw upload bytes in one step.
pub fn prepare_image(
    bytes: &[u8],
    target_size: u32,
    format: TransportFormat,
) -> Result<Vec<u8>, EncodingError> {
    let decoded = decode_image(bytes)?;
    let normalized = normalize(&decoded, target_size);
    encode_image(&normalized, format)
}
