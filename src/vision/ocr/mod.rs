// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR pipeline: detection and recognition backends plus the safe executor
//!
//! Components:
//! - `types` - collaborator traits and result types
//! - `detection` - ONNX text region detection
//! - `recognition` - ONNX CTC text recognition
//! - `preprocessing` - tensor preparation for both models
//! - `session` - locking and running the ONNX sessions
//! - `executor` - validated, retrying execution of the two stages

pub mod detection;
pub mod executor;
pub mod preprocessing;
pub mod recognition;
pub mod session;
pub mod types;

pub use detection::{OcrDetectionModel, TextBox};
pub use executor::{OcrError, OcrExecutor};
pub use recognition::{OcrRecognitionModel, RecognizedText};
pub use types::{DetectedRegion, DetectionResult, PageText, TextDetector, TextLine, TextRecognizer};
