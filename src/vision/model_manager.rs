// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Loads the OCR models once at startup

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::vision::device::{ComputeDevice, DevicePreference};
use crate::vision::ocr::detection::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::vision::ocr::{
    OcrDetectionModel, OcrExecutor, OcrRecognitionModel, TextDetector, TextRecognizer,
};

/// Default directory holding the ONNX OCR models
pub const DEFAULT_MODEL_DIR: &str = "./models/paddleocr-onnx";

/// Configuration for loading the OCR models
#[derive(Debug, Clone)]
pub struct OcrModelConfig {
    /// Detection model (det_model.onnx)
    pub detection_model_path: PathBuf,
    /// Recognition model (rec_model.onnx)
    pub recognition_model_path: PathBuf,
    /// Character dictionary for the recognition model
    pub dictionary_path: PathBuf,
    pub device: DevicePreference,
    /// Probability threshold for detected text pixels
    pub detection_threshold: f32,
}

impl OcrModelConfig {
    /// Standard file layout inside a model directory
    pub fn from_model_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join("det_model.onnx"),
            recognition_model_path: dir.join("rec_model.onnx"),
            dictionary_path: dir.join("ppocr_keys_v1.txt"),
            device: DevicePreference::Auto,
            detection_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl Default for OcrModelConfig {
    fn default() -> Self {
        Self::from_model_dir(DEFAULT_MODEL_DIR)
    }
}

/// Availability of one model
#[derive(Debug, Clone)]
pub struct OcrModelInfo {
    pub name: String,
    pub model_type: String,
    pub available: bool,
}

/// Process-lifetime holder of the OCR models
///
/// A failed load leaves the manager without an executor; the server keeps
/// running and reports the models as unavailable.
#[derive(Debug, Clone)]
pub struct OcrModelManager {
    executor: Option<Arc<OcrExecutor>>,
    device: ComputeDevice,
    detection_loaded: bool,
    recognition_loaded: bool,
}

impl OcrModelManager {
    /// Load both models, logging (not returning) any failure
    pub async fn new(config: OcrModelConfig) -> Self {
        let device = ComputeDevice::select(config.device);
        tracing::info!("Using device: {}", device);

        let detector = match OcrDetectionModel::new(&config.detection_model_path, device).await {
            Ok(model) => {
                tracing::info!(
                    "✅ Detection model loaded from {}",
                    config.detection_model_path.display()
                );
                Some(model.with_confidence_threshold(config.detection_threshold))
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to load detection model: {:#}", e);
                None
            }
        };

        let recognizer = match OcrRecognitionModel::new(
            &config.recognition_model_path,
            &config.dictionary_path,
            device,
        )
        .await
        {
            Ok(model) => {
                tracing::info!(
                    "✅ Recognition model loaded from {}",
                    config.recognition_model_path.display()
                );
                Some(model)
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to load recognition model: {:#}", e);
                None
            }
        };

        let detection_loaded = detector.is_some();
        let recognition_loaded = recognizer.is_some();

        let executor = match (detector, recognizer) {
            (Some(detector), Some(recognizer)) => Some(Arc::new(OcrExecutor::new(
                Arc::new(detector),
                Arc::new(recognizer),
            ))),
            _ => {
                tracing::warn!("OCR models are not loaded, /api/ocr will return 500");
                None
            }
        };

        Self {
            executor,
            device,
            detection_loaded,
            recognition_loaded,
        }
    }

    /// Build a manager around already constructed backends
    pub fn from_backends(
        detector: Arc<dyn TextDetector>,
        recognizer: Arc<dyn TextRecognizer>,
        device: ComputeDevice,
    ) -> Self {
        Self {
            executor: Some(Arc::new(OcrExecutor::new(detector, recognizer))),
            device,
            detection_loaded: true,
            recognition_loaded: true,
        }
    }

    /// A manager whose models failed to load
    pub fn unavailable(device: ComputeDevice) -> Self {
        Self {
            executor: None,
            device,
            detection_loaded: false,
            recognition_loaded: false,
        }
    }

    /// The OCR executor, if both models are loaded
    pub fn executor(&self) -> Option<Arc<OcrExecutor>> {
        self.executor.clone()
    }

    pub fn models_loaded(&self) -> bool {
        self.executor.is_some()
    }

    pub fn device(&self) -> ComputeDevice {
        self.device
    }

    pub fn list_models(&self) -> Vec<OcrModelInfo> {
        vec![
            OcrModelInfo {
                name: "text-detection".to_string(),
                model_type: "detection".to_string(),
                available: self.detection_loaded,
            },
            OcrModelInfo {
                name: "text-recognition".to_string(),
                model_type: "recognition".to_string(),
                available: self.recognition_loaded,
            },
        ]
    }
}
