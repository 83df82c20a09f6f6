// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading helpers for uploaded files

use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use thiserror::Error;

/// Default upload size cap (20MB)
pub const MAX_IMAGE_SIZE: usize = 20 * 1024 * 1024;

/// Errors raised while turning uploaded bytes into an image
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Read format and dimensions from the image header without decoding pixels
///
/// Payloads larger than `max_bytes` are rejected before any parsing.
pub fn read_image_info(bytes: &[u8], max_bytes: usize) -> Result<ImageInfo, ImageError> {
    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge(bytes.len(), max_bytes));
    }

    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    Ok(ImageInfo {
        width,
        height,
        format,
        size_bytes: bytes.len(),
    })
}

/// Decode raw image bytes from a multipart upload
///
/// # Returns
/// * `Ok((DynamicImage, ImageInfo))` - The decoded image and metadata
/// * `Err(ImageError)` - If the payload is empty, larger than `max_bytes`, or not an image
pub fn decode_image_bytes(
    bytes: &[u8],
    max_bytes: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    let info = read_image_info(bytes, max_bytes)?;

    let img = image::load_from_memory_with_format(bytes, info.format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    Ok((img, info))
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF87a / GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II or MM
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}
