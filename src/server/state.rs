//! Application state shared across handlers

use polars::prelude::DataFrame;
use rand::Rng;
use tokio::sync::RwLock;

use crate::data::PropertyRow;
use crate::model::PriceEstimator;

use super::error::{Result, ServerError};
use super::ServerConfig;

/// Shared server state: the trained estimator and the prepared dataset the
/// web page samples rows from. The estimator is behind a lock so a future
/// retrain endpoint could swap it without restarting.
pub struct AppState {
    pub config: ServerConfig,
    pub estimator: RwLock<PriceEstimator>,
    pub dataset: RwLock<DataFrame>,
}

impl AppState {
    pub fn new(config: ServerConfig, estimator: PriceEstimator, dataset: DataFrame) -> Self {
        Self {
            config,
            estimator: RwLock::new(estimator),
            dataset: RwLock::new(dataset),
        }
    }

    /// Pick a random row index for the demo page.
    pub async fn random_row_index(&self) -> Result<usize> {
        let dataset = self.dataset.read().await;
        if dataset.height() == 0 {
            return Err(ServerError::Internal("dataset is empty".to_string()));
        }
        Ok(rand::thread_rng().gen_range(0..dataset.height()))
    }

    pub async fn row(&self, idx: usize) -> Result<PropertyRow> {
        let dataset = self.dataset.read().await;
        PropertyRow::from_frame(&dataset, idx)
            .map_err(|_| ServerError::BadRequest(format!("no property at row {idx}")))
    }
}
