// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX text detection model
//!
//! Runs a DB-style detection network that outputs a per-pixel text
//! probability map, then groups connected pixels above the threshold into
//! bounding boxes.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{Array4, ArrayViewD, IxDyn};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::session::run_first_output;
use super::preprocessing::{preprocess_for_detection, PreprocessInfo, OCR_INPUT_SIZE};
use super::types::{DetectedRegion, DetectionResult, TextDetector};
use crate::vision::device::ComputeDevice;

/// Default probability threshold for text pixels
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.3;

/// Minimum number of pixels in a connected region
const MIN_REGION_PIXELS: usize = 10;

/// A detected text box in preprocessed (640x640) image space
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Mean probability of the pixels in the region
    pub confidence: f32,
}

impl TextBox {
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.confidence > 0.0
    }

    /// Map this box back to original image coordinates as `[x1, y1, x2, y2]`
    pub fn to_original(&self, info: &PreprocessInfo) -> [f32; 4] {
        let (x1, y1) = info.map_to_original(self.x, self.y);
        let (x2, y2) = info.map_to_original(self.x + self.width, self.y + self.height);
        [x1, y1, x2, y2]
    }
}

/// ONNX text detection model
#[derive(Clone)]
pub struct OcrDetectionModel {
    session: Arc<Mutex<Session>>,
    input_name: String,
    confidence_threshold: f32,
}

impl std::fmt::Debug for OcrDetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrDetectionModel")
            .field("input_name", &self.input_name)
            .field("confidence_threshold", &self.confidence_threshold)
            .finish_non_exhaustive()
    }
}

impl OcrDetectionModel {
    /// Load the detection model from an ONNX file
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime cannot load it.
    pub async fn new<P: AsRef<Path>>(model_path: P, device: ComputeDevice) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR detection model not found: {}", model_path.display());
        }

        info!(
            "Loading OCR detection model from {} ({})",
            model_path.display(),
            device
        );

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers(device.execution_providers())
            .context("Failed to set execution providers")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!(
                    "Failed to load OCR detection model from {}",
                    model_path.display()
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        debug!("Detection model input: {}", input_name);
        info!("✅ OCR detection model loaded");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        })
    }

    /// Set the probability threshold for text pixels
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Run detection on a preprocessed `[1, 3, H, W]` tensor
    pub fn detect_tensor(&self, input: &Array4<f32>) -> Result<Vec<TextBox>> {
        let shape = input.shape();
        if shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }
        let (input_height, input_width) = (shape[2], shape[3]);

        let output = run_first_output(&self.session, &self.input_name, input)
            .context("Detection inference failed")?;

        debug!("Detection output shape: {:?}", output.shape());

        let boxes = extract_text_boxes(
            output.view(),
            input_height,
            input_width,
            self.confidence_threshold,
        )?;

        debug!("Detected {} text regions", boxes.len());
        Ok(boxes)
    }

    fn detect_one(&self, image: &DynamicImage) -> Result<DetectionResult> {
        let info = PreprocessInfo::new(image, OCR_INPUT_SIZE);
        let tensor = preprocess_for_detection(image);

        let bboxes = self
            .detect_tensor(&tensor)?
            .into_iter()
            .filter(TextBox::is_valid)
            .map(|b| DetectedRegion {
                bbox: b.to_original(&info),
                confidence: b.confidence,
            })
            .filter(|r| r.bbox[2] > r.bbox[0] && r.bbox[3] > r.bbox[1])
            .collect();

        Ok(DetectionResult::new(bboxes))
    }
}

impl TextDetector for OcrDetectionModel {
    fn detect(&self, images: &[DynamicImage]) -> Result<Vec<DetectionResult>> {
        images.iter().map(|image| self.detect_one(image)).collect()
    }
}

/// Group a probability map of shape `[1, 1, H, W]` or `[1, H, W]` into text boxes
///
/// Boxes are scaled to the `input_height` x `input_width` space and sorted
/// top to bottom, then left to right.
pub fn extract_text_boxes(
    output: ArrayViewD<f32>,
    input_height: usize,
    input_width: usize,
    threshold: f32,
) -> Result<Vec<TextBox>> {
    let output_shape = output.shape();
    let (prob_height, prob_width) = match output_shape.len() {
        4 => (output_shape[2], output_shape[3]),
        3 => (output_shape[1], output_shape[2]),
        _ => anyhow::bail!("Unexpected output shape: {:?}", output_shape),
    };

    let prob_at = |x: usize, y: usize| -> f32 {
        if output_shape.len() == 4 {
            output[IxDyn(&[0, 0, y, x])]
        } else {
            output[IxDyn(&[0, y, x])]
        }
    };

    let scale_y = input_height as f32 / prob_height as f32;
    let scale_x = input_width as f32 / prob_width as f32;

    let mut visited = vec![false; prob_width * prob_height];
    let mut boxes = Vec::new();

    for y in 0..prob_height {
        for x in 0..prob_width {
            if visited[y * prob_width + x] || prob_at(x, y) < threshold {
                continue;
            }

            // 4-connected flood fill
            let mut stack = vec![(x, y)];
            let (mut min_x, mut max_x, mut min_y, mut max_y) = (x, x, y, y);
            let mut count = 0usize;
            let mut sum_conf = 0.0f32;

            while let Some((cx, cy)) = stack.pop() {
                let idx = cy * prob_width + cx;
                if visited[idx] {
                    continue;
                }
                let prob = prob_at(cx, cy);
                if prob < threshold {
                    continue;
                }

                visited[idx] = true;
                count += 1;
                sum_conf += prob;
                min_x = min_x.min(cx);
                max_x = max_x.max(cx);
                min_y = min_y.min(cy);
                max_y = max_y.max(cy);

                if cx > 0 {
                    stack.push((cx - 1, cy));
                }
                if cx + 1 < prob_width {
                    stack.push((cx + 1, cy));
                }
                if cy > 0 {
                    stack.push((cx, cy - 1));
                }
                if cy + 1 < prob_height {
                    stack.push((cx, cy + 1));
                }
            }

            if count > MIN_REGION_PIXELS {
                boxes.push(TextBox {
                    x: min_x as f32 * scale_x,
                    y: min_y as f32 * scale_y,
                    width: (max_x - min_x + 1) as f32 * scale_x,
                    height: (max_y - min_y + 1) as f32 * scale_y,
                    confidence: sum_conf / count as f32,
                });
            }
        }
    }

    boxes.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    Ok(boxes)
}
