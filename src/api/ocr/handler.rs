// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR endpoint handler

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use tracing::{debug, error, info, warn};

use super::response::{format_ocr_result, OcrResponse};
use crate::api::errors::{ApiError, NO_IMAGE_PROVIDED, NO_IMAGE_SELECTED};
use crate::api::http_server::AppState;
use crate::vision::validation::decode_and_validate;
use crate::vision::ValidationOutcome;

/// Name of the multipart field carrying the upload
pub const IMAGE_FIELD: &str = "image";

/// POST /api/ocr - Extract text lines from an uploaded image
///
/// # Request
/// `multipart/form-data` with a file field named `image`.
///
/// # Response
/// - `text_lines`: `{text, confidence, bbox}` records in recognizer order
/// - `message`: present only when no text was detected
///
/// # Errors
/// - 400 Bad Request: missing or unnamed file, file over the upload cap,
///   undecodable or rejected image,
///   detection or recognition failure
/// - 500 Internal Server Error: OCR models not loaded, or the OCR task died
pub async fn ocr_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResponse>, ApiError> {
    // 1. Models must be loaded before any input is examined
    let executor = state.models.executor().ok_or_else(|| {
        warn!("OCR request received but models are not loaded");
        ApiError::ModelUnavailable
    })?;

    // 2. Pull the uploaded file out of the form
    let multipart = multipart.map_err(|e| {
        warn!("Rejected non-multipart OCR request: {}", e);
        ApiError::InvalidInput(NO_IMAGE_PROVIDED.to_string())
    })?;
    let bytes = read_image_field(multipart).await?;

    // 3. Decode and validate
    let image = decode_and_validate(&bytes, state.max_upload_bytes).map_err(|outcome| {
        let reason = match outcome {
            ValidationOutcome::Invalid(reason) => reason,
            ValidationOutcome::Valid => "Invalid image".to_string(),
        };
        warn!("Image validation failed: {}", reason);
        ApiError::InvalidInput(reason)
    })?;

    debug!(
        "Accepted upload: {}x{}, {} bytes",
        image.width(),
        image.height(),
        bytes.len()
    );

    // 4. Run OCR off the async runtime
    let lines = tokio::task::spawn_blocking(move || executor.process(image))
        .await
        .map_err(|e| {
            error!("OCR task failed: {}", e);
            ApiError::internal(e)
        })?
        .map_err(|e| {
            warn!("OCR processing failed: {}", e);
            ApiError::from(e)
        })?;

    info!("OCR complete: {} lines", lines.len());

    // 5. Shape the response
    Ok(Json(format_ocr_result(lines)))
}

/// Read the bytes of the `image` file field
///
/// A field without a filename is not a file upload and is skipped, so a form
/// that only has such a field reports the file as missing.
async fn read_image_field(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart body: {}", e);
        ApiError::InvalidInput(format!("Invalid multipart body: {}", e))
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let Some(file_name) = field.file_name() else {
            continue;
        };

        if file_name.is_empty() {
            return Err(ApiError::InvalidInput(NO_IMAGE_SELECTED.to_string()));
        }
        debug!("Receiving upload '{}'", file_name);

        return field.bytes().await.map_err(|e| {
            warn!("Failed to read uploaded file: {}", e);
            ApiError::InvalidInput(format!("Failed to read uploaded file: {}", e))
        });
    }

    Err(ApiError::InvalidInput(NO_IMAGE_PROVIDED.to_string()))
}
