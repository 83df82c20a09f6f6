// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Tests for GET /health and GET /

use super::support::*;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use std::sync::Arc;
use tower::util::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[cfg(test)]
mod health_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_unhealthy_without_models() {
        let (status, json) = send_json(app_without_models(), get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({
                "status": "unhealthy",
                "models_loaded": false,
                "device": "cpu"
            })
        );
    }

    #[tokio::test]
    async fn test_health_healthy_with_models() {
        let app = app_with(
            Arc::new(FixedDetector { regions: 1 }),
            Arc::new(FixedRecognizer { lines: vec![] }),
        );
        let (status, json) = send_json(app, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["models_loaded"], true);
        assert_eq!(json["device"], "cpu");
    }

    #[tokio::test]
    async fn test_home_page_served() {
        let response = app_without_models().oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("text/html"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("/api/ocr"));
        assert!(html.contains("name=\"image\""));
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/health")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app_without_models().oneshot(request).await.unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = app_without_models()
            .oneshot(get("/v1/ocr"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
