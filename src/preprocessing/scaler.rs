//! Numeric feature scaling

use crate::error::{HomevalError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// No scaling
    None,
}

/// Parameters for one fitted column
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // mean or min
    scale: f64,  // std or range
}

/// Scaler for a fixed, ordered set of numeric columns. Column order at fit
/// time determines column order in the transformed matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    columns: Vec<String>,
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

fn as_f64(df: &DataFrame, col_name: &str) -> Result<Float64Chunked> {
    let series = df
        .column(col_name)
        .map_err(|_| HomevalError::ColumnNotFound(col_name.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| HomevalError::PreprocessingError(e.to_string()))?;
    series
        .f64()
        .map_err(|e| HomevalError::PreprocessingError(e.to_string()))
        .cloned()
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            columns: Vec::new(),
            params: Vec::new(),
            is_fitted: false,
        }
    }

    /// Names of the fitted columns, in output order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Fit scaling parameters over the given columns.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.columns.clear();
        self.params.clear();

        for col_name in columns {
            let ca = as_f64(df, col_name)?;
            self.columns.push(col_name.to_string());
            self.params.push(self.compute_params(&ca));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns into a dense matrix, one column per fitted
    /// column, rows matching the frame. Nulls scale as the column center.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(HomevalError::ModelNotFitted);
        }

        let n_rows = df.height();
        let mut out = Array2::zeros((n_rows, self.columns.len()));

        for (j, (col_name, params)) in self.columns.iter().zip(&self.params).enumerate() {
            let ca = as_f64(df, col_name)?;
            if ca.len() != n_rows {
                return Err(HomevalError::ShapeError {
                    expected: format!("{n_rows} rows"),
                    actual: format!("{} rows in '{col_name}'", ca.len()),
                });
            }
            for (i, opt) in ca.into_iter().enumerate() {
                let v = opt.unwrap_or(params.center);
                out[[i, j]] = (v - params.center) / params.scale;
            }
        }

        Ok(out)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    fn compute_params(&self, ca: &Float64Chunked) -> ScalerParams {
        match self.scaler_type {
            ScalerType::Standard => {
                let mean = ca.mean().unwrap_or(0.0);
                let std = ca.std(1).unwrap_or(1.0);
                ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                }
            }
            ScalerType::MinMax => {
                let min = ca.min().unwrap_or(0.0);
                let max = ca.max().unwrap_or(1.0);
                let range = max - min;
                ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                }
            }
            ScalerType::None => ScalerParams {
                center: 0.0,
                scale: 1.0,
            },
        }
    }
}
