// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::http_server::AppState;
use crate::vision::ComputeDevice;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    /// "healthy" when both OCR models are loaded, otherwise "unhealthy"
    pub status: String,
    pub models_loaded: bool,
    pub device: ComputeDevice,
}

impl HealthResponse {
    pub fn new(models_loaded: bool, device: ComputeDevice) -> Self {
        let status = if models_loaded { "healthy" } else { "unhealthy" };
        Self {
            status: status.to_string(),
            models_loaded,
            device,
        }
    }
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::new(
        state.models.models_loaded(),
        state.models.device(),
    ))
}
