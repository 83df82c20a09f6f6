// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for the OCR endpoint
//!
//! This module provides:
//! - image decoding and validation for uploads
//! - compute device selection for the ONNX sessions
//! - the OCR pipeline and the manager that loads it at startup

pub mod device;
pub mod image_utils;
pub mod model_manager;
pub mod ocr;
pub mod validation;

pub use device::{ComputeDevice, DevicePreference};
pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use model_manager::{OcrModelConfig, OcrModelInfo, OcrModelManager};
pub use validation::{decode_and_validate, validate_image, ValidationOutcome};
