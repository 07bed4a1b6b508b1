//! Real estate price growth estimation.
//!
//! Trains a linear regression on historical property prices and listing
//! attributes to predict the next-year price, persists the fitted model as
//! JSON, and serves a small demo page plus a JSON prediction API.

pub mod cli;
pub mod data;
pub mod error;
pub mod model;
pub mod preprocessing;
pub mod server;

pub use error::{HomevalError, Result};

/// Commonly used types.
pub mod prelude {
    pub use crate::data::{
        clean_dataset, columns, load_dataset, sample_dataset, simulate_future_prices, PropertyRow,
    };
    pub use crate::error::{HomevalError, Result};
    pub use crate::model::{LinearRegression, PriceEstimator, RegressionMetrics, TrainingConfig};
    pub use crate::preprocessing::{
        FeaturePipeline, OneHotEncoder, PipelineConfig, Scaler, ScalerType, TfidfVectorizer,
    };
}
