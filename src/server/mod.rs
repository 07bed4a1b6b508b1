//! Web server for the price estimator
//!
//! Serves the demo page (a random property with a predict button) and the
//! JSON prediction API. At startup the trained model is loaded from disk,
//! or trained from the dataset when no artifact exists yet.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::{PredictForm, PredictRequest};
pub use state::AppState;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::data::load_dataset;
use crate::model::{PriceEstimator, TrainingConfig};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_path: String,
    pub model_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            data_path: std::env::var("DATA_PATH")
                .unwrap_or_else(|_| "./data/properties.csv".to_string()),
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| "./models/price_model.json".to_string()),
        }
    }
}

/// Load the persisted model, or train a fresh one and persist it.
fn load_or_train(
    config: &ServerConfig,
    raw: &polars::prelude::DataFrame,
) -> anyhow::Result<PriceEstimator> {
    if Path::new(&config.model_path).exists() {
        match PriceEstimator::load(&config.model_path) {
            Ok(estimator) if estimator.is_trained() => {
                info!(model_path = %config.model_path, "Loaded persisted model");
                return Ok(estimator);
            }
            Ok(_) => warn!(model_path = %config.model_path, "Persisted model is untrained, retraining"),
            Err(e) => warn!(model_path = %config.model_path, error = %e, "Failed to load model, retraining"),
        }
    }

    let mut estimator = PriceEstimator::new(TrainingConfig::default());
    let metrics = estimator.train(raw)?;
    info!(%metrics, "Model trained");

    if let Some(parent) = Path::new(&config.model_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    estimator.save(&config.model_path)?;
    info!(model_path = %config.model_path, "Model saved");

    Ok(estimator)
}

/// Start the server with the given configuration.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        data_path = %config.data_path,
        model_path = %config.model_path,
        started_at = %start_time.to_rfc3339(),
        "Initializing price estimator server"
    );

    let raw = load_dataset(&config.data_path)?;
    info!(rows = raw.height(), columns = raw.width(), "Dataset loaded");

    let estimator = load_or_train(&config, &raw)?;
    let prepared = estimator.prepare(&raw)?;

    let state = Arc::new(AppState::new(config.clone(), estimator, prepared));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        "Server starting"
    );
    info!(url = %format!("http://{}", addr), "Demo page available");
    info!(url = %format!("http://{}/api/predict", addr), "Prediction API available");
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install CTRL+C signal handler");
            return;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert!(config.model_path.ends_with("price_model.json"));
    }
}
