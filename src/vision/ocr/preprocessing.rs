// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the ONNX OCR models

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Target size for the detection model
pub const OCR_INPUT_SIZE: u32 = 640;

/// Recognition model input height
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Maximum width for recognition model input
pub const REC_MAX_WIDTH: u32 = 320;

/// Mean values for normalization (ImageNet)
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for normalization (ImageNet)
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Preprocess an image for text detection
///
/// Letterboxes the image into an `OCR_INPUT_SIZE` square (gray padding),
/// normalizes with ImageNet mean/std and returns an NCHW tensor `[1, 3, 640, 640]`.
pub fn preprocess_for_detection(image: &DynamicImage) -> Array4<f32> {
    let resized = resize_with_padding(image, OCR_INPUT_SIZE);
    to_normalized_tensor(&resized.to_rgb8())
}

/// Preprocess a cropped text region for recognition
///
/// Resizes to height 48 with the aspect ratio preserved (width clamped to
/// `[4, REC_MAX_WIDTH]`) and returns an NCHW tensor `[1, 3, 48, W]`.
pub fn preprocess_for_recognition(image: &DynamicImage) -> Array4<f32> {
    let (orig_w, orig_h) = image.dimensions();

    let scale = REC_INPUT_HEIGHT as f32 / orig_h.max(1) as f32;
    let new_width = ((orig_w as f32 * scale).round() as u32)
        .min(REC_MAX_WIDTH)
        .max(4);

    let resized = image.resize_exact(
        new_width,
        REC_INPUT_HEIGHT,
        image::imageops::FilterType::Lanczos3,
    );
    to_normalized_tensor(&resized.to_rgb8())
}

fn to_normalized_tensor(rgb: &RgbImage) -> Array4<f32> {
    let (width, height) = rgb.dimensions();
    let mut tensor = Array4::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    tensor
}

/// Resize image with aspect ratio preservation and centered gray padding
pub fn resize_with_padding(image: &DynamicImage, target_size: u32) -> DynamicImage {
    let info = PreprocessInfo::new(image, target_size);

    let mut output = RgbImage::from_pixel(target_size, target_size, Rgb([128, 128, 128]));
    if info.original_width == 0 || info.original_height == 0 {
        return DynamicImage::ImageRgb8(output);
    }

    let (new_w, new_h) = info.scaled_size();
    let resized = image
        .resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3)
        .to_rgb8();

    image::imageops::replace(
        &mut output,
        &resized,
        info.offset_x as i64,
        info.offset_y as i64,
    );

    DynamicImage::ImageRgb8(output)
}

/// Crop a `[x1, y1, x2, y2]` region out of an image, clamped to its bounds
///
/// Returns `None` when the clamped region is degenerate.
pub fn crop_region(image: &DynamicImage, bbox: &[f32; 4]) -> Option<DynamicImage> {
    let (width, height) = image.dimensions();

    let x1 = bbox[0].max(0.0).floor() as u32;
    let y1 = bbox[1].max(0.0).floor() as u32;
    let x2 = (bbox[2].ceil().max(0.0) as u32).min(width);
    let y2 = (bbox[3].ceil().max(0.0) as u32).min(height);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(image.crop_imm(x1, y1, x2 - x1, y2 - y1))
}

/// Scale and padding applied by [`resize_with_padding`]
///
/// Used to map detection output back to original image coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PreprocessInfo {
    pub scale: f32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl PreprocessInfo {
    pub fn new(image: &DynamicImage, target_size: u32) -> Self {
        let (orig_w, orig_h) = image.dimensions();

        if orig_w == 0 || orig_h == 0 {
            return Self {
                scale: 1.0,
                offset_x: 0,
                offset_y: 0,
                original_width: orig_w,
                original_height: orig_h,
            };
        }

        let scale = (target_size as f32 / orig_w as f32).min(target_size as f32 / orig_h as f32);
        let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, target_size);
        let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, target_size);

        Self {
            scale,
            offset_x: (target_size - new_w) / 2,
            offset_y: (target_size - new_h) / 2,
            original_width: orig_w,
            original_height: orig_h,
        }
    }

    fn scaled_size(&self) -> (u32, u32) {
        let w = (self.original_width as f32 * self.scale).round() as u32;
        let h = (self.original_height as f32 * self.scale).round() as u32;
        (w.max(1), h.max(1))
    }

    /// Map a point from preprocessed space back to original image space
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        let orig_x = (x - self.offset_x as f32) / self.scale;
        let orig_y = (y - self.offset_y as f32) / self.scale;
        (
            orig_x.clamp(0.0, self.original_width as f32),
            orig_y.clamp(0.0, self.original_height as f32),
        )
    }
}
