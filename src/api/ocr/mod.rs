// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR API endpoint module
//!
//! Provides POST /api/ocr for extracting text lines from an uploaded image.

pub mod handler;
pub mod response;

pub use handler::ocr_handler;
pub use response::{format_ocr_result, OcrResponse, NO_TEXT_MESSAGE};
