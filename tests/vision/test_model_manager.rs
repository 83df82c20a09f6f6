// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! OCR Model Manager tests
//!
//! Verify that the OcrModelManager:
//! - Resolves model paths from a model directory
//! - Degrades gracefully when model files are missing
//! - Reports loaded models and the selected device

use fabstir_ocr_node::vision::{
    ComputeDevice, DevicePreference, OcrModelConfig, OcrModelInfo, OcrModelManager,
};
use std::path::PathBuf;

// Model directory (downloaded by the model download script)
const OCR_MODEL_DIR: &str = "/workspace/models/paddleocr-onnx";

#[cfg(test)]
mod model_manager_tests {
    use super::*;

    // =============================================================================
    // OcrModelConfig Tests
    // =============================================================================

    #[test]
    fn test_config_from_model_dir() {
        let config = OcrModelConfig::from_model_dir("/opt/ocr");

        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/opt/ocr/det_model.onnx")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/opt/ocr/rec_model.onnx")
        );
        assert_eq!(
            config.dictionary_path,
            PathBuf::from("/opt/ocr/ppocr_keys_v1.txt")
        );
    }

    #[test]
    fn test_default_config_points_at_paddleocr() {
        let config = OcrModelConfig::default();
        assert!(config
            .detection_model_path
            .to_string_lossy()
            .contains("paddleocr"));
        assert_eq!(config.device, DevicePreference::Auto);
    }

    #[test]
    fn test_model_info_clone() {
        let info = OcrModelInfo {
            name: "text-detection".to_string(),
            model_type: "detection".to_string(),
            available: true,
        };
        let cloned = info.clone();
        assert_eq!(cloned.name, info.name);
        assert!(cloned.available);
    }

    // =============================================================================
    // Loading Tests
    // =============================================================================

    #[tokio::test]
    async fn test_manager_handles_missing_directory() {
        let mut config = OcrModelConfig::from_model_dir("/nonexistent/path/to/ocr");
        config.device = DevicePreference::Cpu;

        let manager = OcrModelManager::new(config).await;

        assert!(!manager.models_loaded());
        assert!(manager.executor().is_none());
        assert_eq!(manager.device(), ComputeDevice::Cpu);

        let models = manager.list_models();
        assert_eq!(models.len(), 2);
        assert!(models.iter().all(|m| !m.available));
    }

    #[tokio::test]
    async fn test_manager_handles_missing_dictionary() {
        let mut config = OcrModelConfig::from_model_dir(OCR_MODEL_DIR);
        config.dictionary_path = PathBuf::from("/nonexistent/keys.txt");
        config.device = DevicePreference::Cpu;

        let manager = OcrModelManager::new(config).await;

        // Recognition can never load without its dictionary
        assert!(!manager.models_loaded());
        let recognition = manager
            .list_models()
            .into_iter()
            .find(|m| m.model_type == "recognition")
            .unwrap();
        assert!(!recognition.available);
    }

    #[tokio::test]
    #[ignore] // Requires downloaded ONNX models
    async fn test_manager_loads_real_models() {
        let mut config = OcrModelConfig::from_model_dir(OCR_MODEL_DIR);
        config.device = DevicePreference::Cpu;

        let manager = OcrModelManager::new(config).await;

        assert!(manager.models_loaded());
        assert!(manager.executor().is_some());
        assert!(manager.list_models().iter().all(|m| m.available));
    }
}
