// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Safe OCR execution
//!
//! Runs detection then recognition against the configured backends and turns
//! every failure into an [`OcrError`]. The HTTP layer never sees a raw backend
//! error or a panic.
//!
//! Policy:
//! - "no result" and "no regions" from either stage mean zero lines, not an error
//! - detection failures are reported immediately
//! - a recognition failure triggers exactly one retry of detection and
//!   recognition; if the retry does not produce lines the *original* failure
//!   is reported

use image::DynamicImage;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use super::types::{TextDetector, TextLine, TextRecognizer};
use crate::vision::validation::{normalize_color_mode, validate_image, ValidationOutcome};

/// Failure of a single OCR request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OcrError {
    /// The image failed validation; carries the validator's reason verbatim
    #[error("{0}")]
    InvalidImage(String),

    #[error("Text detection failed: {0}")]
    DetectionFailed(String),

    #[error("Text recognition failed: {0}")]
    RecognitionFailed(String),

    /// Anything not handled by the per-stage checks
    #[error("OCR processing failed: {0}")]
    ProcessingFailed(String),
}

/// Runs the detection and recognition backends for one image at a time
#[derive(Clone)]
pub struct OcrExecutor {
    detector: Arc<dyn TextDetector>,
    recognizer: Arc<dyn TextRecognizer>,
}

impl std::fmt::Debug for OcrExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrExecutor").finish_non_exhaustive()
    }
}

impl OcrExecutor {
    pub fn new(detector: Arc<dyn TextDetector>, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            detector,
            recognizer,
        }
    }

    /// Extract text lines from an image
    ///
    /// Blocks until both backends return. Returns an empty vector when no
    /// text was found.
    pub fn process(&self, image: DynamicImage) -> Result<Vec<TextLine>, OcrError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.process_inner(image))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Unexpected error in OCR process: {}", message);
                Err(OcrError::ProcessingFailed(message))
            }
        }
    }

    fn process_inner(&self, image: DynamicImage) -> Result<Vec<TextLine>, OcrError> {
        if let ValidationOutcome::Invalid(reason) = validate_image(&image) {
            return Err(OcrError::InvalidImage(reason));
        }

        let images = [normalize_color_mode(image)];
        info!(
            "Processing image of size: {}x{}",
            images[0].width(),
            images[0].height()
        );

        match self.detect_regions(&images)? {
            0 => return Ok(Vec::new()),
            count => info!("Detected {} text regions", count),
        }

        match self.recognize_lines(&images) {
            Ok(lines) => Ok(lines),
            Err(original) => {
                error!("Recognition failed: {:#}", original);
                self.retry_recognition(&images)
                    .ok_or_else(|| OcrError::RecognitionFailed(format!("{:#}", original)))
            }
        }
    }

    /// Number of regions the detector found in the first image
    fn detect_regions(&self, images: &[DynamicImage]) -> Result<usize, OcrError> {
        let results = self.detector.detect(images).map_err(|e| {
            error!("Detection failed: {:#}", e);
            OcrError::DetectionFailed(format!("{:#}", e))
        })?;

        match results.first() {
            None => {
                warn!("No detection results returned");
                Ok(0)
            }
            Some(result) if result.is_empty() => {
                info!("No text regions detected in image");
                Ok(0)
            }
            Some(result) => Ok(result.bboxes.len()),
        }
    }

    fn recognize_lines(&self, images: &[DynamicImage]) -> anyhow::Result<Vec<TextLine>> {
        let pages = self.recognizer.recognize(images, self.detector.as_ref())?;

        let Some(page) = pages.into_iter().next() else {
            warn!("No recognition results returned");
            return Ok(Vec::new());
        };

        if page.text_lines.is_empty() {
            info!("No text lines found in recognition result");
        } else {
            info!("Recognized {} text lines", page.text_lines.len());
        }
        Ok(page.text_lines)
    }

    /// Re-run detection and recognition once; `Some` only for a non-empty result
    fn retry_recognition(&self, images: &[DynamicImage]) -> Option<Vec<TextLine>> {
        info!("Attempting alternative recognition approach...");

        if let Err(e) = self.detector.detect(images) {
            error!("Retry also failed: {:#}", e);
            return None;
        }

        match self.recognize_lines(images) {
            Ok(lines) if !lines.is_empty() => Some(lines),
            Ok(_) => {
                warn!("Retry produced no text lines");
                None
            }
            Err(e) => {
                error!("Retry also failed: {:#}", e);
                None
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
