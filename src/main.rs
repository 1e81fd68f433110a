//! Customer Churn Predictor - Main Entry Point
//!
//! Loads the classifier once and serves the prediction form over HTTP.

use anyhow::{Context, Result};
use churn_predictor::{
    config::AppConfig,
    feature_extractor::{FeatureEncoder, FeatureSchema},
    models::{ModelLoader, OnnxClassifier, Predictor},
    server::{self, AppState},
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("churn_predictor={}", config.logging.level).parse()?),
        )
        .init();

    info!("Starting Customer Churn Predictor");
    info!(
        "Risk tiers: very high>{:.2}, moderate>{:.2}",
        config.risk_tiers.very_high, config.risk_tiers.moderate
    );

    // The app cannot serve without a classifier
    let schema = FeatureSchema::churn();
    let model = ModelLoader::with_threads(config.model.onnx_threads)
        .load_model(&config.model.path, &schema)
        .with_context(|| format!("Failed to load classifier from {}", config.model.path))?;

    let predictor = Predictor::new(
        Arc::new(OnnxClassifier::new(model)),
        FeatureEncoder::new(schema),
        config.risk_tiers.clone(),
    )?;

    server::serve(&config.server, AppState::new(predictor)).await
}
