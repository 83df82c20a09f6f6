// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod health;
pub mod home;
pub mod http_server;
pub mod ocr;

pub use errors::{ApiError, ErrorResponse};
pub use health::{health_handler, HealthResponse};
pub use home::home_handler;
pub use http_server::{create_app, start_server, AppState};
pub use ocr::{format_ocr_result, ocr_handler, OcrResponse};
