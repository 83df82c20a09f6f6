// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR response types

use serde::{Deserialize, Serialize};

use crate::vision::ocr::TextLine;

/// Message returned alongside an empty line list
pub const NO_TEXT_MESSAGE: &str = "No text was detected in this image";

/// Successful response from POST /api/ocr
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResponse {
    /// Recognized lines in recognizer order, each `{text, confidence, bbox}`
    pub text_lines: Vec<TextLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OcrResponse {
    pub fn new(text_lines: Vec<TextLine>) -> Self {
        Self {
            text_lines,
            message: None,
        }
    }

    /// Response for an image with no detected text
    pub fn empty() -> Self {
        Self {
            text_lines: Vec::new(),
            message: Some(NO_TEXT_MESSAGE.to_string()),
        }
    }
}

/// Shape executor output into the response body
///
/// An empty result carries [`NO_TEXT_MESSAGE`]. Otherwise lines whose text is
/// blank after trimming are dropped and the rest keep their order. If every
/// line is blank the list is empty but no message is attached.
pub fn format_ocr_result(lines: Vec<TextLine>) -> OcrResponse {
    if lines.is_empty() {
        return OcrResponse::empty();
    }

    OcrResponse::new(lines.into_iter().filter(|line| !line.is_blank()).collect())
}
