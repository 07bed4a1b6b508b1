//! Model training, evaluation and persistence.

pub mod estimator;
pub mod linear;
pub mod metrics;

pub use estimator::{PriceEstimator, TrainingConfig};
pub use linear::LinearRegression;
pub use metrics::RegressionMetrics;
