//! One-hot encoding for categorical columns

use crate::error::{HomevalError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder for a single string column. Categories are sorted
/// lexicographically at fit time; rows with a category unseen during fit
/// encode as all zeros.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    column: String,
    categories: Vec<String>,
    is_fitted: bool,
}

fn str_column<'a>(df: &'a DataFrame, col_name: &str) -> Result<&'a StringChunked> {
    df.column(col_name)
        .map_err(|_| HomevalError::ColumnNotFound(col_name.to_string()))?
        .as_materialized_series()
        .str()
        .map_err(|e| HomevalError::PreprocessingError(e.to_string()))
}

impl OneHotEncoder {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            categories: Vec::new(),
            is_fitted: false,
        }
    }

    /// The learned categories, sorted. One output column per category.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Output feature names, `{column}_{category}`.
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{c}", self.column))
            .collect()
    }

    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let ca = str_column(df, &self.column)?;
        let unique: BTreeSet<String> = ca.into_iter().flatten().map(str::to_string).collect();
        self.categories = unique.into_iter().collect();
        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(HomevalError::ModelNotFitted);
        }

        let ca = str_column(df, &self.column)?;
        let mut out = Array2::zeros((ca.len(), self.categories.len()));
        for (i, opt) in ca.into_iter().enumerate() {
            if let Some(value) = opt {
                if let Ok(j) = self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
                    out[[i, j]] = 1.0;
                }
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }
}
