// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Fabstir OCR Node

/// Full version string with feature description
pub const VERSION: &str = "v1.0.0-onnx-ocr-2025-10-20";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.0.0";

/// Build date
pub const BUILD_DATE: &str = "2025-10-20";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "text-detection",
    "text-recognition",
    "recognition-retry",
    "cuda-execution-provider",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Fabstir OCR Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}
