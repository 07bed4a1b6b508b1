//! Feature pipeline
//!
//! Combines the scaler, the one-hot encoder and the two TF-IDF vectorizers
//! into one fitted transformer. Output column layout is fixed:
//! scaled numerics, then one-hot categories, then one TF-IDF block per
//! text column in configuration order.

use super::{
    encoder::OneHotEncoder,
    scaler::{Scaler, ScalerType},
    text::TfidfVectorizer,
};
use crate::data::columns;
use crate::error::{HomevalError, Result};
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Which columns feed the pipeline, and how numerics are scaled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub numeric_columns: Vec<String>,
    pub categorical_column: String,
    pub text_columns: Vec<String>,
    pub scaler_type: ScalerType,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            numeric_columns: vec![
                columns::PRICE_2023.to_string(),
                columns::PRICE_2024.to_string(),
                columns::PRICE_2025.to_string(),
                columns::AREA.to_string(),
                columns::BEDROOMS.to_string(),
                columns::BATHROOMS.to_string(),
            ],
            categorical_column: columns::PROPERTY_TYPE.to_string(),
            text_columns: vec![
                columns::AMENITIES.to_string(),
                columns::NEARBY_FACILITY.to_string(),
            ],
            scaler_type: ScalerType::Standard,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePipeline {
    config: PipelineConfig,
    scaler: Scaler,
    encoder: OneHotEncoder,
    text_vectorizers: Vec<TfidfVectorizer>,
    is_fitted: bool,
}

fn text_documents<'a>(df: &'a DataFrame, col_name: &str) -> Result<Vec<&'a str>> {
    let ca = df
        .column(col_name)
        .map_err(|_| HomevalError::ColumnNotFound(col_name.to_string()))?
        .as_materialized_series()
        .str()
        .map_err(|e| HomevalError::PreprocessingError(e.to_string()))?;
    Ok(ca.into_iter().map(|opt| opt.unwrap_or("")).collect())
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let scaler = Scaler::new(config.scaler_type);
        let encoder = OneHotEncoder::new(config.categorical_column.clone());
        let text_vectorizers = config
            .text_columns
            .iter()
            .map(|_| TfidfVectorizer::new())
            .collect();
        Self {
            config,
            scaler,
            encoder,
            text_vectorizers,
            is_fitted: false,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let numeric: Vec<&str> = self.config.numeric_columns.iter().map(|s| s.as_str()).collect();
        self.scaler.fit(df, &numeric)?;
        self.encoder.fit(df)?;

        for (vectorizer, col_name) in self
            .text_vectorizers
            .iter_mut()
            .zip(&self.config.text_columns)
        {
            let docs = text_documents(df, col_name)?;
            vectorizer.fit(&docs)?;
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Produce the dense feature matrix for a cleaned frame. Fails when a
    /// configured column is absent.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(HomevalError::ModelNotFitted);
        }

        let mut blocks = Vec::with_capacity(2 + self.text_vectorizers.len());
        blocks.push(self.scaler.transform(df)?);
        blocks.push(self.encoder.transform(df)?);

        // the two text blocks are the wide ones, vectorize them in parallel
        if self.text_vectorizers.len() == 2 {
            let (a, b) = rayon::join(
                || -> Result<Array2<f64>> {
                    self.text_vectorizers[0].transform(&text_documents(df, &self.config.text_columns[0])?)
                },
                || -> Result<Array2<f64>> {
                    self.text_vectorizers[1].transform(&text_documents(df, &self.config.text_columns[1])?)
                },
            );
            blocks.push(a?);
            blocks.push(b?);
        } else {
            for (vectorizer, col_name) in self.text_vectorizers.iter().zip(&self.config.text_columns) {
                blocks.push(vectorizer.transform(&text_documents(df, col_name)?)?);
            }
        }

        let views: Vec<_> = blocks.iter().map(|b| b.view()).collect();
        concatenate(Axis(1), &views)
            .map_err(|e| HomevalError::PreprocessingError(e.to_string()))
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Total width of the transformed matrix.
    pub fn n_features(&self) -> usize {
        self.config.numeric_columns.len()
            + self.encoder.categories().len()
            + self
                .text_vectorizers
                .iter()
                .map(|v| v.n_features())
                .sum::<usize>()
    }

    /// Output column names, in matrix order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.config.numeric_columns.clone();
        names.extend(self.encoder.feature_names());
        for (vectorizer, col_name) in self.text_vectorizers.iter().zip(&self.config.text_columns) {
            names.extend(
                vectorizer
                    .vocabulary()
                    .iter()
                    .map(|term| format!("{col_name}_{term}")),
            );
        }
        names
    }
}
