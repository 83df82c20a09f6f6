// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vision::ocr::OcrError;

pub const MODELS_NOT_LOADED: &str = "OCR models are not loaded. Server setup is incomplete.";
pub const NO_IMAGE_PROVIDED: &str = "No image file provided";
pub const NO_IMAGE_SELECTED: &str = "No image file selected";
pub const PROCESSING_FAILED: &str = "Failed to process the image";

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Missing file, bad multipart body or rejected image
    #[error("{0}")]
    InvalidInput(String),

    #[error("{}", MODELS_NOT_LOADED)]
    ModelUnavailable,

    #[error("{0}")]
    DetectionFailed(String),

    #[error("{0}")]
    RecognitionFailed(String),

    /// Raw failure text goes to `details`, the client sees a generic message
    #[error("{}", PROCESSING_FAILED)]
    Internal { details: String },
}

impl ApiError {
    pub fn internal(details: impl ToString) -> Self {
        ApiError::Internal {
            details: details.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_)
            | ApiError::DetectionFailed(_)
            | ApiError::RecognitionFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::ModelUnavailable | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let details = match self {
            ApiError::Internal { details } => Some(details.clone()),
            _ => None,
        };

        ErrorResponse {
            error: self.to_string(),
            details,
        }
    }
}

impl From<OcrError> for ApiError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::DetectionFailed(_) => ApiError::DetectionFailed(err.to_string()),
            OcrError::RecognitionFailed(_) => ApiError::RecognitionFailed(err.to_string()),
            OcrError::InvalidImage(_) | OcrError::ProcessingFailed(_) => {
                ApiError::InvalidInput(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
