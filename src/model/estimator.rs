//! Price estimator: pipeline + regression model + persistence

use crate::data::{clean_dataset, columns, simulate_future_prices, PropertyRow};
use crate::error::{HomevalError, Result};
use crate::model::{LinearRegression, RegressionMetrics};
use crate::preprocessing::{FeaturePipeline, PipelineConfig};
use chrono::{DateTime, Utc};
use ndarray::Array1;
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How training runs: target, split, and whether the 2026 target is
/// simulated from 2023 prices when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub target_column: String,
    pub test_size: f64,
    pub seed: u64,
    pub simulate_growth: bool,
    pub pipeline: PipelineConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            target_column: columns::PRICE_2026.to_string(),
            test_size: 0.2,
            seed: 42,
            simulate_growth: true,
            pipeline: PipelineConfig::default(),
        }
    }
}

/// A trained next-year price model. Serializable as a single JSON artifact
/// so the server can reload it without retraining.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEstimator {
    config: TrainingConfig,
    pipeline: FeaturePipeline,
    model: LinearRegression,
    metrics: Option<RegressionMetrics>,
    trained_at: Option<DateTime<Utc>>,
}

impl PriceEstimator {
    pub fn new(config: TrainingConfig) -> Self {
        let pipeline = FeaturePipeline::new(config.pipeline.clone());
        Self {
            config,
            pipeline,
            model: LinearRegression::new(),
            metrics: None,
            trained_at: None,
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_fitted()
    }

    /// Held-out metrics from the last training run.
    pub fn metrics(&self) -> Option<&RegressionMetrics> {
        self.metrics.as_ref()
    }

    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        self.trained_at
    }

    pub fn n_features(&self) -> usize {
        self.pipeline.n_features()
    }

    /// Clean a raw frame and, when configured, derive the future price
    /// columns. This is the frame `train` actually fits on.
    pub fn prepare(&self, df: &DataFrame) -> Result<DataFrame> {
        let cleaned = clean_dataset(df)?;
        if self.config.simulate_growth || cleaned.column(&self.config.target_column).is_err() {
            simulate_future_prices(&cleaned, self.config.seed)
        } else {
            Ok(cleaned)
        }
    }

    fn target_vector(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let ca = df
            .column(&self.config.target_column)
            .map_err(|_| HomevalError::ColumnNotFound(self.config.target_column.clone()))?
            .as_materialized_series()
            .f64()
            .map_err(|e| HomevalError::TrainingError(e.to_string()))?
            .clone();
        Ok(ca.into_iter().map(|v| v.unwrap_or(0.0)).collect())
    }

    /// Seeded shuffle split. Rows with a null target are dropped first.
    fn split_indices(&self, df: &DataFrame) -> Result<(Vec<IdxSize>, Vec<IdxSize>)> {
        let target = df
            .column(&self.config.target_column)
            .map_err(|_| HomevalError::ColumnNotFound(self.config.target_column.clone()))?
            .as_materialized_series()
            .f64()
            .map_err(|e| HomevalError::TrainingError(e.to_string()))?
            .clone();

        let mut indices: Vec<IdxSize> = target
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|_| i as IdxSize))
            .collect();

        if indices.is_empty() {
            return Err(HomevalError::TrainingError(
                "no rows with a valid target value".to_string(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        indices.shuffle(&mut rng);

        let n_test = ((indices.len() as f64) * self.config.test_size).round() as usize;
        let n_test = n_test.min(indices.len().saturating_sub(1));
        let test = indices.split_off(indices.len() - n_test);
        Ok((indices, test))
    }

    /// Fit the pipeline and model on a raw frame and evaluate on the
    /// held-out split. With too few rows for a split, evaluation falls
    /// back to the training rows.
    pub fn train(&mut self, df: &DataFrame) -> Result<RegressionMetrics> {
        let prepared = self.prepare(df)?;
        let (train_idx, test_idx) = self.split_indices(&prepared)?;

        let train_df = prepared
            .take(&IdxCa::from_vec("idx".into(), train_idx))
            .map_err(|e| HomevalError::TrainingError(e.to_string()))?;

        let x_train = self.pipeline.fit_transform(&train_df)?;
        let y_train = self.target_vector(&train_df)?;
        self.model.fit(&x_train, &y_train)?;

        let metrics = if test_idx.is_empty() {
            let y_pred = self.model.predict(&x_train)?;
            RegressionMetrics::compute(&y_train, &y_pred)?
        } else {
            let test_df = prepared
                .take(&IdxCa::from_vec("idx".into(), test_idx))
                .map_err(|e| HomevalError::TrainingError(e.to_string()))?;
            let x_test = self.pipeline.transform(&test_df)?;
            let y_test = self.target_vector(&test_df)?;
            let y_pred = self.model.predict(&x_test)?;
            RegressionMetrics::compute(&y_test, &y_pred)?
        };

        self.metrics = Some(metrics.clone());
        self.trained_at = Some(Utc::now());
        Ok(metrics)
    }

    /// Predict next-year prices for a cleaned frame.
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<f64>> {
        if !self.is_trained() {
            return Err(HomevalError::ModelNotFitted);
        }
        let x = self.pipeline.transform(df)?;
        self.model.predict(&x)
    }

    /// Predict for a single property.
    pub fn predict_row(&self, row: &PropertyRow) -> Result<f64> {
        let frame = row.to_frame()?;
        let predictions = self.predict(&frame)?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| HomevalError::ComputationError("empty prediction".to_string()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let estimator: Self = serde_json::from_str(&json)?;
        Ok(estimator)
    }
}
