// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use fabstir_ocr_node::{
    api::{start_server, AppState},
    config::ServerConfig,
    version,
    vision::OcrModelManager,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();

    println!("🚀 Starting {}...", version::get_version_string());
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!();

    println!("👁️  Loading OCR models from {}...", config.model_dir.display());
    let models = OcrModelManager::new(config.model_config()).await;

    for model in models.list_models() {
        let status = if model.available { "✓" } else { "✗" };
        println!("     {} {} ({})", status, model.name, model.model_type);
    }
    if models.models_loaded() {
        println!("✅ OCR models loaded on {}", models.device());
    } else {
        println!("⚠️  OCR models are not loaded");
        println!("   /api/ocr will return 500 and /health will report unhealthy");
    }

    let addr = config.socket_addr()?;
    println!("🌐 Serving on http://{}", addr);

    start_server(AppState::new(models, config.max_upload_bytes), addr).await
}
