//! Ordinary least squares with optional L2 regularization

use crate::error::{HomevalError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Cholesky factorization of a symmetric positive-definite matrix.
/// Returns the lower-triangular factor, or None when the matrix is not PD.
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Some(l)
}

/// Solve L L^T x = b by forward then backward substitution.
fn cholesky_substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    x
}

/// Gauss-Jordan inverse with partial pivoting. Fallback when the normal
/// equations matrix is not positive definite even after jitter.
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    let mut aug = Array2::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }
        if max_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [max_row, j]);
            }
        }
        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    let mut inv = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inv[[i, j]] = aug[[i, n + j]];
        }
    }
    Some(inv)
}

/// Solve (X^T X) w = X^T y. Cholesky first; if the Gram matrix is not PD
/// (collinear features), retry with diagonal jitter, then fall back to an
/// explicit inverse.
fn solve_normal_equations(xtx: &Array2<f64>, xty: &Array1<f64>) -> Option<Array1<f64>> {
    if let Some(l) = cholesky(xtx) {
        return Some(cholesky_substitute(&l, xty));
    }

    let n = xtx.nrows();
    let jitter = 1e-8 * xtx.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
    let mut regularized = xtx.clone();
    for k in 0..n {
        regularized[[k, k]] += jitter;
    }
    if let Some(l) = cholesky(&regularized) {
        return Some(cholesky_substitute(&l, xty));
    }

    matrix_inverse(xtx).map(|inv| inv.dot(xty))
}

/// Linear regression fitted via the normal equations. `alpha > 0` gives
/// ridge regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
    fit_intercept: bool,
    alpha: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
            alpha: 0.0,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(HomevalError::ShapeError {
                expected: format!("{} targets", x.nrows()),
                actual: format!("{} targets", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(HomevalError::TrainingError(
                "cannot fit on an empty matrix".to_string(),
            ));
        }

        let (x_centered, y_centered, means) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| HomevalError::ComputationError("empty feature matrix".to_string()))?;
            let y_mean = y.mean().unwrap_or(0.0);
            let x_centered = x - &x_mean.clone().insert_axis(Axis(0));
            (x_centered, y - y_mean, Some((x_mean, y_mean)))
        } else {
            (x.clone(), y.clone(), None)
        };

        let mut xtx = x_centered.t().dot(&x_centered);
        if self.alpha > 0.0 {
            for i in 0..xtx.nrows() {
                xtx[[i, i]] += self.alpha;
            }
        }
        let xty = x_centered.t().dot(&y_centered);

        let coefficients = solve_normal_equations(&xtx, &xty).ok_or_else(|| {
            HomevalError::ComputationError("normal equations matrix is singular".to_string())
        })?;

        self.intercept = match &means {
            Some((x_mean, y_mean)) => y_mean - coefficients.dot(x_mean),
            None => 0.0,
        };
        self.coefficients = Some(coefficients);

        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(HomevalError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(HomevalError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(coefficients) + self.intercept)
    }

    /// R² on the given data.
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let y_pred = self.predict(x)?;
        let y_mean = y.mean().unwrap_or(0.0);
        let ss_res = (&y_pred - y).mapv(|v| v * v).sum();
        let ss_tot = y.mapv(|v| (v - y_mean) * (v - y_mean)).sum();
        if ss_tot == 0.0 {
            return Ok(1.0);
        }
        Ok(1.0 - ss_res / ss_tot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_recovers_known_coefficients() {
        // y = 2*x1 + 3*x2 + 1
        let x = array![
            [1.0, 1.0],
            [2.0, 1.0],
            [1.0, 2.0],
            [2.0, 2.0],
            [3.0, 1.0],
        ];
        let y = array![6.0, 8.0, 9.0, 11.0, 10.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-8);
        assert!((coef[1] - 3.0).abs() < 1e-8);
        assert!((model.intercept() - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_collinear_features_still_solve() {
        // second column duplicates the first, Gram matrix is singular
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let r2 = model.score(&x, &y).unwrap();
        assert!(r2 > 0.99, "R² = {r2}");
    }

    #[test]
    fn test_ridge_shrinks_coefficients() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];

        let mut ols = LinearRegression::new();
        ols.fit(&x, &y).unwrap();
        let mut ridge = LinearRegression::new().with_alpha(10.0);
        ridge.fit(&x, &y).unwrap();

        assert!(ridge.coefficients().unwrap()[0].abs() < ols.coefficients().unwrap()[0].abs());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = LinearRegression::new();
        let x = array![[1.0]];
        assert!(matches!(
            model.predict(&x),
            Err(HomevalError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut model = LinearRegression::new();
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_matrix_inverse_identity() {
        let m = array![[2.0, 0.0], [0.0, 4.0]];
        let inv = matrix_inverse(&m).unwrap();
        assert!((inv[[0, 0]] - 0.5).abs() < 1e-12);
        assert!((inv[[1, 1]] - 0.25).abs() < 1e-12);
    }
}
