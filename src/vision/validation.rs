// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image validation run before any model work

use image::{ColorType, DynamicImage};

use super::image_utils::{decode_image_bytes, read_image_info, ImageError};

/// Minimum accepted width and height in pixels
pub const MIN_DIMENSION: u32 = 50;

/// Maximum accepted pixel count (~50 megapixels)
pub const MAX_PIXELS: u64 = 50_000_000;

pub const TOO_SMALL_REASON: &str = "Image too small (minimum 50x50 pixels)";
pub const TOO_LARGE_REASON: &str = "Image too large (maximum ~50 megapixels)";

/// Result of validating an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(String),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// The rejection reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Invalid(reason) => Some(reason),
        }
    }
}

/// Check image dimensions against the size limits
pub fn validate_dimensions(width: u32, height: u32) -> ValidationOutcome {
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return ValidationOutcome::Invalid(TOO_SMALL_REASON.to_string());
    }

    if width as u64 * height as u64 > MAX_PIXELS {
        return ValidationOutcome::Invalid(TOO_LARGE_REASON.to_string());
    }

    ValidationOutcome::Valid
}

/// Validate a decoded image
///
/// Color mode is never a rejection reason; see [`normalize_color_mode`].
pub fn validate_image(image: &DynamicImage) -> ValidationOutcome {
    validate_dimensions(image.width(), image.height())
}

/// Whether the color mode is one the models accept as-is (RGB, RGBA, grayscale)
pub fn is_accepted_color_mode(color: ColorType) -> bool {
    matches!(color, ColorType::Rgb8 | ColorType::Rgba8 | ColorType::L8)
}

/// Convert any color mode other than 8-bit RGB into 8-bit RGB
pub fn normalize_color_mode(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Decode uploaded bytes and validate the resulting image
///
/// Dimensions are read from the header and checked before any pixel data is
/// decoded. Read failures become an `Invalid` outcome carrying the decoder's
/// message. Images in an unaccepted color mode are converted to RGB.
pub fn decode_and_validate(
    bytes: &[u8],
    max_bytes: usize,
) -> Result<DynamicImage, ValidationOutcome> {
    let info = read_image_info(bytes, max_bytes).map_err(invalid_upload)?;

    tracing::debug!(
        "Read {:?} header: {}x{}, {} bytes",
        info.format,
        info.width,
        info.height,
        info.size_bytes
    );

    if let invalid @ ValidationOutcome::Invalid(_) = validate_dimensions(info.width, info.height)
    {
        return Err(invalid);
    }

    let (image, _) = decode_image_bytes(bytes, max_bytes).map_err(invalid_upload)?;

    let image = if is_accepted_color_mode(image.color()) {
        image
    } else {
        normalize_color_mode(image)
    };

    match validate_image(&image) {
        ValidationOutcome::Valid => Ok(image),
        invalid => Err(invalid),
    }
}

fn invalid_upload(error: ImageError) -> ValidationOutcome {
    match error {
        ImageError::TooLarge(..) => ValidationOutcome::Invalid(error.to_string()),
        other => ValidationOutcome::Invalid(format!("Invalid image format: {}", other)),
    }
}
