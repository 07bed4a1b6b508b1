//! Integration test: feature pipeline end-to-end

use homeval::data::{clean_dataset, columns, sample_dataset};
use homeval::preprocessing::{FeaturePipeline, PipelineConfig, ScalerType};
use polars::prelude::*;

fn property_df() -> DataFrame {
    df!(
        columns::AREA => &[120.0, 250.0, 90.0, 310.0, 140.0, 75.0],
        columns::PROPERTY_TYPE => &["Apartment", "Villa", "Apartment", "Villa", "Apartment", "Apartment"],
        columns::BEDROOMS => &[3i64, 5, 2, 6, 3, 2],
        columns::BATHROOMS => &[2i64, 3, 1, 4, 2, 1],
        columns::AMENITIES => &[Some("pool gym"), Some("garden pool security"), None, Some("garden"), Some("gym"), Some("balcony")],
        columns::NEARBY_FACILITY => &["school", "mall park", "school metro", "park", "mall", "school"],
        columns::PRICE_2023 => &["2,000,000", "5,500,000", "1,200,000", "7,000,000", "2,400,000", "950,000"],
        columns::PRICE_2024 => &["2,300,000", "6,400,000", "1,450,000", "8,200,000", "2,800,000", "1,100,000"],
        columns::PRICE_2025 => &["2,700,000", "7,300,000", "1,700,000", "9,500,000", "3,200,000", "1,300,000"],
    )
    .unwrap()
}

#[test]
fn test_pipeline_on_cleaned_frame() {
    let df = clean_dataset(&property_df()).unwrap();
    let mut pipeline = FeaturePipeline::new(PipelineConfig::default());
    let matrix = pipeline.fit_transform(&df).unwrap();

    assert_eq!(matrix.nrows(), 6);
    assert_eq!(matrix.ncols(), pipeline.n_features());
    assert!(matrix.iter().all(|v| v.is_finite()));
}

#[test]
fn test_feature_layout() {
    let df = clean_dataset(&property_df()).unwrap();
    let mut pipeline = FeaturePipeline::new(PipelineConfig::default());
    pipeline.fit(&df).unwrap();

    let names = pipeline.feature_names();
    // numerics first, then one-hot, then the two TF-IDF blocks
    assert_eq!(&names[0..6], &[
        columns::PRICE_2023,
        columns::PRICE_2024,
        columns::PRICE_2025,
        columns::AREA,
        columns::BEDROOMS,
        columns::BATHROOMS,
    ]);
    assert_eq!(names[6], format!("{}_Apartment", columns::PROPERTY_TYPE));
    assert_eq!(names[7], format!("{}_Villa", columns::PROPERTY_TYPE));
    assert!(names[8..].iter().any(|n| n.starts_with(columns::AMENITIES)));
    assert!(names.last().unwrap().starts_with(columns::NEARBY_FACILITY));
}

#[test]
fn test_standard_scaling_zero_mean() {
    let df = clean_dataset(&property_df()).unwrap();
    let mut pipeline = FeaturePipeline::new(PipelineConfig {
        scaler_type: ScalerType::Standard,
        ..PipelineConfig::default()
    });
    let matrix = pipeline.fit_transform(&df).unwrap();

    for j in 0..6 {
        let mean: f64 = matrix.column(j).iter().sum::<f64>() / matrix.nrows() as f64;
        assert!(mean.abs() < 1e-10, "column {j} mean = {mean}");
    }
}

#[test]
fn test_unseen_rows_transform() {
    let df = clean_dataset(&property_df()).unwrap();
    let mut pipeline = FeaturePipeline::new(PipelineConfig::default());
    pipeline.fit(&df).unwrap();

    // unseen category and unseen amenity terms must not fail
    let new_row = df!(
        columns::AREA => &[180.0],
        columns::PROPERTY_TYPE => &["Duplex"],
        columns::BEDROOMS => &[4i64],
        columns::BATHROOMS => &[2i64],
        columns::AMENITIES => &["jacuzzi sauna"],
        columns::NEARBY_FACILITY => &["airport"],
        columns::PRICE_2023 => &[3_000_000.0],
        columns::PRICE_2024 => &[3_500_000.0],
        columns::PRICE_2025 => &[4_000_000.0],
    )
    .unwrap();

    let matrix = pipeline.transform(&new_row).unwrap();
    assert_eq!(matrix.nrows(), 1);
    // one-hot block is all zeros for the unknown category
    assert_eq!(matrix[[0, 6]], 0.0);
    assert_eq!(matrix[[0, 7]], 0.0);
    // unseen terms give empty TF-IDF blocks
    assert!(matrix.row(0).iter().skip(8).all(|v| *v == 0.0));
}

#[test]
fn test_pipeline_on_generated_dataset() {
    let df = clean_dataset(&sample_dataset(100, 21).unwrap()).unwrap();
    let mut pipeline = FeaturePipeline::new(PipelineConfig::default());
    let matrix = pipeline.fit_transform(&df).unwrap();

    assert_eq!(matrix.nrows(), 100);
    assert!(matrix.ncols() >= 8, "expected one-hot and text features");
}

#[test]
fn test_fitted_pipeline_survives_serde() {
    let df = clean_dataset(&property_df()).unwrap();
    let mut pipeline = FeaturePipeline::new(PipelineConfig::default());
    let before = pipeline.fit_transform(&df).unwrap();

    let json = serde_json::to_string(&pipeline).unwrap();
    let restored: FeaturePipeline = serde_json::from_str(&json).unwrap();
    let after = restored.transform(&df).unwrap();

    assert_eq!(before, after);
}
