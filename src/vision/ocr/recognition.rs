// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX text recognition model
//!
//! Reads the text of each region the detector finds using a CTC recognition
//! network and greedy decoding.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{Array4, ArrayViewD, IxDyn};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::session::run_first_output;
use super::preprocessing::{crop_region, preprocess_for_recognition, REC_INPUT_HEIGHT};
use super::types::{PageText, TextDetector, TextLine, TextRecognizer};
use crate::vision::device::ComputeDevice;

/// Recognized text with confidence score
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    /// Mean of the per-character confidences (0.0-1.0)
    pub confidence: f32,
    pub char_confidences: Vec<f32>,
}

/// ONNX text recognition model
#[derive(Clone)]
pub struct OcrRecognitionModel {
    session: Arc<Mutex<Session>>,
    /// Character dictionary for CTC decoding, index 0 is the blank token
    dictionary: Arc<Vec<char>>,
    input_name: String,
}

impl std::fmt::Debug for OcrRecognitionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrRecognitionModel")
            .field("dictionary_size", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl OcrRecognitionModel {
    /// Load the recognition model and its character dictionary
    ///
    /// # Errors
    /// Returns error if either file is missing or ONNX Runtime cannot load
    /// the model.
    pub async fn new<P: AsRef<Path>>(
        model_path: P,
        dict_path: P,
        device: ComputeDevice,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let dict_path = dict_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR recognition model not found: {}", model_path.display());
        }
        if !dict_path.exists() {
            anyhow::bail!(
                "OCR character dictionary not found: {}",
                dict_path.display()
            );
        }

        info!(
            "Loading OCR recognition model from {} ({})",
            model_path.display(),
            device
        );

        let dictionary = load_dictionary(dict_path)?;
        info!(
            "Loaded character dictionary with {} characters",
            dictionary.len()
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
                    "Failed to load OCR recognition model from {}",
                    model_path.display()
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        info!("✅ OCR recognition model loaded");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            dictionary: Arc::new(dictionary),
            input_name,
        })
    }

    pub fn dictionary_size(&self) -> usize {
        self.dictionary.len()
    }

    /// Recognize text from a preprocessed `[1, 3, 48, W]` tensor
    pub fn recognize_tensor(&self, input: &Array4<f32>) -> Result<RecognizedText> {
        let shape = input.shape();
        if shape[0] != 1 || shape[1] != 3 || shape[2] != REC_INPUT_HEIGHT as usize || shape[3] < 4
        {
            anyhow::bail!(
                "Invalid input shape: {:?}, expected [1, 3, {}, W>=4]",
                shape,
                REC_INPUT_HEIGHT
            );
        }

        let output = run_first_output(&self.session, &self.input_name, input)
            .context("Recognition inference failed")?;

        ctc_greedy_decode(output.view(), &self.dictionary)
    }

    fn recognize_page(
        &self,
        image: &DynamicImage,
        detector: &dyn TextDetector,
    ) -> Result<PageText> {
        let detections = detector.detect(std::slice::from_ref(image))?;
        let Some(detection) = detections.into_iter().next() else {
            return Ok(PageText::default());
        };

        let mut text_lines = Vec::with_capacity(detection.bboxes.len());
        for region in &detection.bboxes {
            let Some(crop) = crop_region(image, &region.bbox) else {
                warn!("Skipping degenerate region {:?}", region.bbox);
                continue;
            };

            let recognized = self.recognize_tensor(&preprocess_for_recognition(&crop))?;
            text_lines.push(TextLine::new(
                recognized.text,
                recognized.confidence,
                region.bbox.to_vec(),
            ));
        }

        debug!("Recognized {} text lines", text_lines.len());
        Ok(PageText::new(text_lines))
    }
}

impl TextRecognizer for OcrRecognitionModel {
    fn recognize(
        &self,
        images: &[DynamicImage],
        detector: &dyn TextDetector,
    ) -> Result<Vec<PageText>> {
        images
            .iter()
            .map(|image| self.recognize_page(image, detector))
            .collect()
    }
}

/// Load a character dictionary, one character per line
///
/// Index 0 is reserved for the CTC blank token. A space is appended when
/// the file does not contain one.
pub fn load_dictionary<P: AsRef<Path>>(path: P) -> Result<Vec<char>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;

    let mut dictionary = vec!['\0'];
    for line in BufReader::new(file).lines() {
        let line = line.context("Failed to read dictionary line")?;
        if let Some(ch) = line.chars().next() {
            dictionary.push(ch);
        }
    }

    if !dictionary[1..].contains(&' ') {
        dictionary.push(' ');
    }

    Ok(dictionary)
}

/// CTC greedy (best path) decoding
///
/// Expects `[batch, seq_len, classes]` or `[seq_len, classes]` probabilities.
/// Repeated classes collapse and the blank (index 0) separates repeats.
pub fn ctc_greedy_decode(output: ArrayViewD<f32>, dictionary: &[char]) -> Result<RecognizedText> {
    let output_shape = output.shape();
    let (seq_len, num_classes) = match output_shape.len() {
        3 => (output_shape[1], output_shape[2]),
        2 => (output_shape[0], output_shape[1]),
        _ => anyhow::bail!("Unexpected output shape: {:?}", output_shape),
    };

    let mut text = String::new();
    let mut char_confidences = Vec::new();
    let mut prev_index: Option<usize> = None;

    for t in 0..seq_len {
        let (max_index, max_prob) = (0..num_classes)
            .map(|c| {
                let prob = if output_shape.len() == 3 {
                    output[IxDyn(&[0, t, c])]
                } else {
                    output[IxDyn(&[t, c])]
                };
                (c, prob)
            })
            .fold((0usize, f32::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            });

        if max_index != 0 && Some(max_index) != prev_index && max_index < dictionary.len() {
            text.push(dictionary[max_index]);
            char_confidences.push(max_prob);
        }

        prev_index = (max_index != 0).then_some(max_index);
    }

    let confidence = if char_confidences.is_empty() {
        0.0
    } else {
        let mean = char_confidences.iter().sum::<f32>() / char_confidences.len() as f32;
        mean.clamp(0.0, 1.0)
    };

    Ok(RecognizedText {
        text,
        confidence,
        char_confidences,
    })
}
