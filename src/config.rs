// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server configuration from command-line flags and environment variables

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::vision::device::DevicePreference;
use crate::vision::image_utils::MAX_IMAGE_SIZE;
use crate::vision::model_manager::{OcrModelConfig, DEFAULT_MODEL_DIR};
use crate::vision::ocr::detection::DEFAULT_CONFIDENCE_THRESHOLD;

/// Fabstir OCR Node
#[derive(Parser, Debug, Clone)]
#[command(name = "fabstir-ocr-node")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "HTTP OCR service backed by ONNX text detection and recognition models", long_about = None)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to
    #[arg(long, env = "OCR_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the HTTP server
    #[arg(long, env = "OCR_PORT", default_value_t = 5004)]
    pub port: u16,

    /// Directory holding det_model.onnx, rec_model.onnx and ppocr_keys_v1.txt
    #[arg(long, env = "OCR_MODEL_PATH", default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// Detection model, overrides <model-dir>/det_model.onnx
    #[arg(long, env = "OCR_DETECTION_MODEL")]
    pub detection_model: Option<PathBuf>,

    /// Recognition model, overrides <model-dir>/rec_model.onnx
    #[arg(long, env = "OCR_RECOGNITION_MODEL")]
    pub recognition_model: Option<PathBuf>,

    /// Character dictionary, overrides <model-dir>/ppocr_keys_v1.txt
    #[arg(long, env = "OCR_DICTIONARY")]
    pub dictionary: Option<PathBuf>,

    /// Compute device (auto/cpu/cuda)
    #[arg(long, env = "OCR_DEVICE", default_value = "auto")]
    pub device: DevicePreference,

    /// Text pixel probability threshold for detection
    #[arg(long, env = "OCR_DETECTION_THRESHOLD", default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    pub detection_threshold: f32,

    /// Maximum accepted image file size in bytes
    #[arg(long, env = "OCR_MAX_UPLOAD_BYTES", default_value_t = MAX_IMAGE_SIZE)]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Socket address the server listens on
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid host address: {}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Model paths with per-file overrides applied
    pub fn model_config(&self) -> OcrModelConfig {
        let mut config = OcrModelConfig::from_model_dir(&self.model_dir);
        if let Some(path) = &self.detection_model {
            config.detection_model_path = path.clone();
        }
        if let Some(path) = &self.recognition_model {
            config.recognition_model_path = path.clone();
        }
        if let Some(path) = &self.dictionary {
            config.dictionary_path = path.clone();
        }
        config.device = self.device;
        config.detection_threshold = self.detection_threshold;
        config
    }
}
