// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! OCR endpoint tests for POST /api/ocr
//!
//! These tests drive the full router with stand-in OCR backends and verify:
//! - Missing models short-circuit with 500 before the upload is read
//! - Upload problems return 400 with fixed messages
//! - Validation and OCR failures return 400 with their messages
//! - Successful responses drop blank lines and keep recognizer order

use super::support::*;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use image::{DynamicImage, ImageBuffer, Luma};
use std::sync::Arc;

fn app_reading(texts: &[&str]) -> axum::Router {
    app_with(
        Arc::new(FixedDetector { regions: 2 }),
        Arc::new(FixedRecognizer {
            lines: lines(texts),
        }),
    )
}

#[cfg(test)]
mod ocr_endpoint_tests {
    use super::*;

    // =============================================================================
    // Model Availability
    // =============================================================================

    #[tokio::test]
    async fn test_models_not_loaded_returns_500() {
        let (status, json) = send_json(app_without_models(), upload_request(&valid_png())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json["error"],
            "OCR models are not loaded. Server setup is incomplete."
        );
    }

    #[tokio::test]
    async fn test_models_checked_before_upload() {
        // Even a request with no file reports the missing models
        let request = ocr_request(multipart_body("other", Some("a.png"), b"x"));
        let (status, json) = send_json(app_without_models(), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json["error"],
            "OCR models are not loaded. Server setup is incomplete."
        );
    }

    // =============================================================================
    // Upload Errors
    // =============================================================================

    #[tokio::test]
    async fn test_missing_image_field() {
        let request = ocr_request(multipart_body("document", Some("scan.png"), &valid_png()));
        let (status, json) = send_json(app_reading(&["Hello"]), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, serde_json::json!({ "error": "No image file provided" }));
    }

    #[tokio::test]
    async fn test_image_field_without_file() {
        let request = ocr_request(multipart_body("image", None, b"not a file"));
        let (status, json) = send_json(app_reading(&["Hello"]), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No image file provided");
    }

    #[tokio::test]
    async fn test_non_multipart_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/ocr")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"image": "abc"}"#))
            .unwrap();
        let (status, json) = send_json(app_reading(&["Hello"]), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No image file provided");
    }

    #[tokio::test]
    async fn test_empty_filename() {
        let request = ocr_request(multipart_body("image", Some(""), &valid_png()));
        let (status, json) = send_json(app_reading(&["Hello"]), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No image file selected");
    }

    // =============================================================================
    // Image Validation
    // =============================================================================

    #[tokio::test]
    async fn test_undecodable_upload() {
        let (status, json) =
            send_json(app_reading(&["Hello"]), upload_request(b"definitely not an image")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error = json["error"].as_str().unwrap();
        assert!(
            error.starts_with("Invalid image format"),
            "unexpected error: {}",
            error
        );
    }

    #[tokio::test]
    async fn test_image_too_small() {
        let tiny = png_bytes(&DynamicImage::new_rgb8(49, 200));
        let (status, json) = send_json(app_reading(&["Hello"]), upload_request(&tiny)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Image too small (minimum 50x50 pixels)");
    }

    #[tokio::test]
    async fn test_image_over_pixel_limit() {
        // Valid PNG header for 10_000 x 5_001 with no pixel data behind it
        let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        png.extend_from_slice(&13u32.to_be_bytes());
        let ihdr_start = png.len();
        png.extend_from_slice(b"IHDR");
        png.extend_from_slice(&10_000u32.to_be_bytes());
        png.extend_from_slice(&5_001u32.to_be_bytes());
        png.extend_from_slice(&[8, 0, 0, 0, 0]);
        let crc = crc32(&png[ihdr_start..]);
        png.extend_from_slice(&crc.to_be_bytes());
        png.extend_from_slice(&0u32.to_be_bytes());
        png.extend_from_slice(b"IDAT");
        png.extend_from_slice(&crc32(b"IDAT").to_be_bytes());
        png.extend_from_slice(&0u32.to_be_bytes());
        png.extend_from_slice(b"IEND");
        png.extend_from_slice(&crc32(b"IEND").to_be_bytes());

        let (status, json) = send_json(app_reading(&["Hello"]), upload_request(&png)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Image too large (maximum ~50 megapixels)");
    }

    #[tokio::test]
    async fn test_upload_over_configured_cap() {
        let app = app_with_limit(
            Arc::new(FixedDetector { regions: 1 }),
            Arc::new(FixedRecognizer {
                lines: lines(&["Hello"]),
            }),
            1024,
        );
        let mut upload = valid_png();
        upload.resize(2048, 0);

        let (status, json) = send_json(app, upload_request(&upload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"],
            "Image data is too large: 2048 bytes (max: 1024 bytes)"
        );
    }

    #[tokio::test]
    async fn test_upload_at_configured_cap_accepted() {
        // The multipart framing pushes the body past the cap; the file itself fits
        let upload = valid_png();
        let app = app_with_limit(
            Arc::new(FixedDetector { regions: 1 }),
            Arc::new(FixedRecognizer {
                lines: lines(&["Fits"]),
            }),
            upload.len(),
        );

        let (status, json) = send_json(app, upload_request(&upload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["text_lines"][0]["text"], "Fits");
    }

    #[tokio::test]
    async fn test_unaccepted_color_mode_is_converted() {
        // 16-bit grayscale is not an accepted mode and gets converted, not rejected
        let gray16: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(80, 80, Luma([40_000u16]));
        let bytes = png_bytes(&DynamicImage::ImageLuma16(gray16));

        let (status, json) = send_json(app_reading(&["Converted"]), upload_request(&bytes)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["text_lines"][0]["text"], "Converted");
    }

    // =============================================================================
    // OCR Results
    // =============================================================================

    #[tokio::test]
    async fn test_lines_returned_in_order_without_blanks() {
        let app = app_reading(&["First line", "   ", "Second line", ""]);
        let (status, json) = send_json(app, upload_request(&valid_png())).await;

        assert_eq!(status, StatusCode::OK);
        let lines = json["text_lines"].as_array().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["text"], "First line");
        assert_eq!(lines[1]["text"], "Second line");
        assert_eq!(lines[1]["bbox"], serde_json::json!([0.0, 20.0, 50.0, 30.0]));
        assert!(lines[0]["confidence"].as_f64().unwrap() > 0.89);
        assert!(json.get("message").is_none());
    }

    #[tokio::test]
    async fn test_no_regions_detected() {
        let app = app_with(
            Arc::new(FixedDetector { regions: 0 }),
            Arc::new(FixedRecognizer {
                lines: lines(&["never read"]),
            }),
        );
        let (status, json) = send_json(app, upload_request(&valid_png())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({
                "text_lines": [],
                "message": "No text was detected in this image"
            })
        );
    }

    #[tokio::test]
    async fn test_detection_failure() {
        let recognizer = Arc::new(FailingRecognizer::default());
        let app = app_with(Arc::new(FailingDetector), recognizer.clone());
        let (status, json) = send_json(app, upload_request(&valid_png())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Text detection failed: detector offline");
        assert_eq!(recognizer.calls(), 0, "recognition must not run");
    }

    #[tokio::test]
    async fn test_recognition_failure_retried_once() {
        let recognizer = Arc::new(FailingRecognizer::default());
        let app = app_with(Arc::new(FixedDetector { regions: 1 }), recognizer.clone());
        let (status, json) = send_json(app, upload_request(&valid_png())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Text recognition failed: recognizer exploded");
        assert_eq!(recognizer.calls(), 2);
    }

    #[tokio::test]
    async fn test_panicking_backend_contained() {
        let app = app_with(
            Arc::new(FixedDetector { regions: 1 }),
            Arc::new(PanickingRecognizer),
        );
        let (status, json) = send_json(app, upload_request(&valid_png())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"],
            "OCR processing failed: recognizer lost its weights"
        );
    }

    #[tokio::test]
    async fn test_get_not_allowed() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/ocr")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send_json(app_reading(&["Hello"]), request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
