// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// GET / - upload form for trying the OCR endpoint from a browser
pub async fn home_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
