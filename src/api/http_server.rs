// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{health::health_handler, home::home_handler, ocr::ocr_handler};
use crate::vision::image_utils::MAX_IMAGE_SIZE;
use crate::vision::{ComputeDevice, OcrModelManager};

/// Shared state for all request handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// OCR models loaded at startup
    pub models: Arc<OcrModelManager>,
    /// Largest accepted image file, in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(models: OcrModelManager, max_upload_bytes: usize) -> Self {
        Self {
            models: Arc::new(models),
            max_upload_bytes,
        }
    }

    /// State with no models loaded, running on CPU
    pub fn new_for_test() -> Self {
        Self::new(OcrModelManager::unavailable(ComputeDevice::Cpu), MAX_IMAGE_SIZE)
    }
}

/// Headroom for multipart boundaries and part headers around the file
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the router with all routes and middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(home_handler))
        .route("/health", get(health_handler))
        .route("/api/ocr", post(ocr_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("OCR server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
