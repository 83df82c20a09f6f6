// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Types shared between the OCR executor and the model backends
//!
//! The executor only ever talks to [`TextDetector`] and [`TextRecognizer`];
//! the ONNX models in `detection` / `recognition` are one implementation.

use anyhow::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// A single detected text region in original image pixel space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedRegion {
    /// [x1, y1, x2, y2]
    pub bbox: [f32; 4],
    /// Detection confidence score (0.0-1.0)
    pub confidence: f32,
}

/// Detector output for one image of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub bboxes: Vec<DetectedRegion>,
}

impl DetectionResult {
    pub fn new(bboxes: Vec<DetectedRegion>) -> Self {
        Self { bboxes }
    }

    pub fn is_empty(&self) -> bool {
        self.bboxes.is_empty()
    }
}

/// One recognized line of text
///
/// Missing fields fall back to their zero values when deserialized:
/// `text` to `""`, `confidence` to `0.0` and `bbox` to `[]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLine {
    /// Recognized text (possibly empty)
    pub text: String,
    /// Recognition confidence score
    pub confidence: f32,
    /// Bounding box [x1, y1, x2, y2] in pixels
    pub bbox: Vec<f32>,
}

impl TextLine {
    pub fn new(text: impl Into<String>, confidence: f32, bbox: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            confidence,
            bbox,
        }
    }

    /// True if the text is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Recognizer output for one image of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    #[serde(default)]
    pub text_lines: Vec<TextLine>,
}

impl PageText {
    pub fn new(text_lines: Vec<TextLine>) -> Self {
        Self { text_lines }
    }
}

/// Locates text regions in a batch of images
///
/// Returns one [`DetectionResult`] per input image. An empty vector means the
/// detector had nothing to report.
pub trait TextDetector: Send + Sync {
    fn detect(&self, images: &[DynamicImage]) -> Result<Vec<DetectionResult>>;
}

/// Reads the text of a batch of images
///
/// The recognizer receives the detector handle and derives the regions it
/// reads from on its own.
pub trait TextRecognizer: Send + Sync {
    fn recognize(
        &self,
        images: &[DynamicImage],
        detector: &dyn TextDetector,
    ) -> Result<Vec<PageText>>;
}
