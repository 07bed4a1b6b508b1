//! Regression evaluation metrics

use crate::error::{HomevalError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Held-out evaluation of a fitted price model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub n_samples: usize,
}

impl RegressionMetrics {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(HomevalError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(HomevalError::InvalidInput(
                "cannot score an empty target vector".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let residuals = y_pred - y_true;
        let mse = residuals.mapv(|v| v * v).sum() / n;
        let mae = residuals.mapv(f64::abs).sum() / n;

        let y_mean = y_true.mean().unwrap_or(0.0);
        let ss_tot = y_true.mapv(|v| (v - y_mean) * (v - y_mean)).sum();
        let r2 = if ss_tot == 0.0 {
            1.0
        } else {
            1.0 - (mse * n) / ss_tot
        };

        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
            n_samples: y_true.len(),
        })
    }
}

impl std::fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rmse={:.2} mae={:.2} r2={:.4} (n={})",
            self.rmse, self.mae, self.r2, self.n_samples
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_predictions() {
        let y = array![1.0, 2.0, 3.0];
        let m = RegressionMetrics::compute(&y, &y).unwrap();
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.r2, 1.0);
    }

    #[test]
    fn test_known_errors() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![2.0, 2.0, 3.0, 3.0];
        let m = RegressionMetrics::compute(&y_true, &y_pred).unwrap();
        assert!((m.mse - 0.5).abs() < 1e-12);
        assert!((m.mae - 0.5).abs() < 1e-12);
        assert!((m.rmse - 0.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        let a = array![1.0];
        let b = array![1.0, 2.0];
        assert!(RegressionMetrics::compute(&a, &b).is_err());
    }
}
