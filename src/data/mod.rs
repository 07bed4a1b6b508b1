//! Property dataset loading and cleanup
//!
//! The raw CSV stores prices as strings with thousands separators and leaves
//! the free-text columns null when a listing has no amenities. Everything
//! downstream (the feature pipeline, the web page) expects a cleaned frame:
//! f64 prices, empty strings instead of nulls, and an integer-coded property
//! type alongside the original label.

use crate::error::{HomevalError, Result};
use polars::prelude::*;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::path::Path;

/// Column names of the property dataset.
pub mod columns {
    pub const LOCATION: &str = "Location";
    pub const AREA: &str = "Area (sqm)";
    pub const PROPERTY_TYPE: &str = "Property Type";
    pub const PROPERTY_TYPE_ENCODED: &str = "Property Type Encoded";
    pub const BEDROOMS: &str = "Bedrooms";
    pub const BATHROOMS: &str = "Bathrooms";
    pub const AMENITIES: &str = "Amenities";
    pub const NEARBY_FACILITY: &str = "Nearby Facility";
    pub const PRICE_2023: &str = "Price 2023 (EGP)";
    pub const PRICE_2024: &str = "Price 2024 (EGP)";
    pub const PRICE_2025: &str = "Price 2025 (EGP)";
    /// Target variable: the simulated next-year price.
    pub const PRICE_2026: &str = "Price 2026 (EGP)";
}

/// The historical price columns present in the raw CSV.
pub const PRICE_COLUMNS: [&str; 3] = [
    columns::PRICE_2023,
    columns::PRICE_2024,
    columns::PRICE_2025,
];

/// The free-text columns, vectorized with TF-IDF downstream.
pub const TEXT_COLUMNS: [&str; 2] = [columns::AMENITIES, columns::NEARBY_FACILITY];

/// Load the property CSV with header and schema inference.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))
        .map_err(|e| HomevalError::DataError(format!("{}: {e}", path.as_ref().display())))?
        .finish()
        .map_err(|e| HomevalError::DataError(e.to_string()))
}

/// Write a frame back to CSV (predictions output, cleaned datasets).
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path.as_ref())
        .map_err(|e| HomevalError::DataError(e.to_string()))?;
    CsvWriter::new(&mut file)
        .finish(df)
        .map_err(|e| HomevalError::DataError(e.to_string()))
}

/// Parse a price column to f64, stripping thousands separators when the
/// column was read as strings. Unparseable entries become null.
fn parse_price_series(series: &Series) -> Result<Series> {
    match series.dtype() {
        DataType::String => {
            let ca = series
                .str()
                .map_err(|e| HomevalError::DataError(e.to_string()))?;
            let parsed: Float64Chunked = ca
                .into_iter()
                .map(|opt| opt.and_then(|s| s.trim().replace(',', "").parse::<f64>().ok()))
                .collect();
            Ok(parsed.with_name(series.name().clone()).into_series())
        }
        _ => series
            .cast(&DataType::Float64)
            .map_err(|e| HomevalError::DataError(e.to_string())),
    }
}

/// Replace nulls in a text column with empty strings.
fn fill_text_series(series: &Series) -> Result<Series> {
    let ca = series
        .str()
        .map_err(|e| HomevalError::DataError(e.to_string()))?;
    let filled: StringChunked = ca.into_iter().map(|opt| Some(opt.unwrap_or(""))).collect();
    Ok(filled.with_name(series.name().clone()).into_series())
}

/// Encode the property type label: 0 for apartment (case-insensitive),
/// 1 for anything else. Matches the mapping the JSON API applies.
pub fn encode_property_type(label: &str) -> i64 {
    if label.trim().eq_ignore_ascii_case("apartment") {
        0
    } else {
        1
    }
}

/// Clean a raw property frame:
/// - price columns parsed to f64 (thousands separators stripped),
/// - text columns null-filled with `""`,
/// - a `Property Type Encoded` integer column added.
pub fn clean_dataset(df: &DataFrame) -> Result<DataFrame> {
    let mut result = df.clone();

    for col_name in PRICE_COLUMNS {
        if let Ok(column) = df.column(col_name) {
            let parsed = parse_price_series(column.as_materialized_series())?;
            result = result
                .with_column(parsed)
                .map_err(|e| HomevalError::DataError(e.to_string()))?
                .clone();
        }
    }

    for col_name in TEXT_COLUMNS {
        if let Ok(column) = df.column(col_name) {
            let filled = fill_text_series(column.as_materialized_series())?;
            result = result
                .with_column(filled)
                .map_err(|e| HomevalError::DataError(e.to_string()))?
                .clone();
        }
    }

    if let Ok(column) = df.column(columns::PROPERTY_TYPE) {
        let ca = column
            .as_materialized_series()
            .str()
            .map_err(|e| HomevalError::DataError(e.to_string()))?;
        let encoded: Int64Chunked = ca
            .into_iter()
            .map(|opt| Some(opt.map(encode_property_type).unwrap_or(1)))
            .collect();
        let encoded = encoded
            .with_name(columns::PROPERTY_TYPE_ENCODED.into())
            .into_series();
        result = result
            .with_column(encoded)
            .map_err(|e| HomevalError::DataError(e.to_string()))?
            .clone();
    }

    Ok(result)
}

/// Overwrite the 2024/2025 prices and derive the 2026 target variable from
/// per-row uniform growth factors. Deterministic for a fixed seed; the
/// growth ranges mirror the historical appreciation the dataset encodes
/// (10-30% into 2024, 10-25% afterwards).
pub fn simulate_future_prices(df: &DataFrame, seed: u64) -> Result<DataFrame> {
    let base = df
        .column(columns::PRICE_2023)
        .map_err(|_| HomevalError::ColumnNotFound(columns::PRICE_2023.to_string()))?
        .as_materialized_series()
        .f64()
        .map_err(|e| HomevalError::DataError(e.to_string()))?
        .clone();

    let n = base.len();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let growth_2024: Vec<f64> = (0..n).map(|_| rng.gen_range(0.10..0.30)).collect();
    let growth_2025: Vec<f64> = (0..n).map(|_| rng.gen_range(0.10..0.25)).collect();
    let growth_2026: Vec<f64> = (0..n).map(|_| rng.gen_range(0.10..0.25)).collect();

    // a null 2023 price stays null through the simulation so the row is
    // dropped by the null-target filter instead of training on zeros
    let mut p2024: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut p2025: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut p2026: Vec<Option<f64>> = Vec::with_capacity(n);
    for (i, opt) in base.into_iter().enumerate() {
        match opt {
            Some(p23) => {
                let p24 = p23 * (1.0 + growth_2024[i]);
                let p25 = p24 * (1.0 + growth_2025[i]);
                let p26 = p25 * (1.0 + growth_2026[i]);
                p2024.push(Some(p24));
                p2025.push(Some(p25));
                p2026.push(Some(p26));
            }
            None => {
                p2024.push(None);
                p2025.push(None);
                p2026.push(None);
            }
        }
    }

    let mut result = df.clone();
    for (name, values) in [
        (columns::PRICE_2024, p2024),
        (columns::PRICE_2025, p2025),
        (columns::PRICE_2026, p2026),
    ] {
        result = result
            .with_column(Series::new(name.into(), values))
            .map_err(|e| HomevalError::DataError(e.to_string()))?
            .clone();
    }

    Ok(result)
}

/// A single property row, extracted from a cleaned frame or received over
/// the JSON API.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PropertyRow {
    pub area: f64,
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub property_type: String,
    pub amenities: String,
    pub nearby_facility: String,
    pub price_2023: f64,
    pub price_2024: f64,
    pub price_2025: f64,
}

fn numeric_at(df: &DataFrame, col: &str, idx: usize) -> Result<f64> {
    let series = df
        .column(col)
        .map_err(|_| HomevalError::ColumnNotFound(col.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| HomevalError::DataError(e.to_string()))?;
    Ok(series
        .f64()
        .map_err(|e| HomevalError::DataError(e.to_string()))?
        .get(idx)
        .unwrap_or(0.0))
}

fn text_at(df: &DataFrame, col: &str, idx: usize) -> Result<String> {
    let column = df
        .column(col)
        .map_err(|_| HomevalError::ColumnNotFound(col.to_string()))?;
    let ca = column
        .as_materialized_series()
        .str()
        .map_err(|e| HomevalError::DataError(e.to_string()))?;
    Ok(ca.get(idx).unwrap_or("").to_string())
}

impl PropertyRow {
    /// Extract the row at `idx` from a cleaned frame.
    pub fn from_frame(df: &DataFrame, idx: usize) -> Result<Self> {
        if idx >= df.height() {
            return Err(HomevalError::InvalidInput(format!(
                "row index {idx} out of range ({} rows)",
                df.height()
            )));
        }
        Ok(Self {
            area: numeric_at(df, columns::AREA, idx)?,
            bedrooms: numeric_at(df, columns::BEDROOMS, idx)?,
            bathrooms: numeric_at(df, columns::BATHROOMS, idx)?,
            property_type: text_at(df, columns::PROPERTY_TYPE, idx)?,
            amenities: text_at(df, columns::AMENITIES, idx)?,
            nearby_facility: text_at(df, columns::NEARBY_FACILITY, idx)?,
            price_2023: numeric_at(df, columns::PRICE_2023, idx)?,
            price_2024: numeric_at(df, columns::PRICE_2024, idx)?,
            price_2025: numeric_at(df, columns::PRICE_2025, idx)?,
        })
    }

    /// Build a one-row cleaned frame suitable for prediction.
    pub fn to_frame(&self) -> Result<DataFrame> {
        DataFrame::new(vec![
            Series::new(columns::PRICE_2023.into(), &[self.price_2023]).into(),
            Series::new(columns::PRICE_2024.into(), &[self.price_2024]).into(),
            Series::new(columns::PRICE_2025.into(), &[self.price_2025]).into(),
            Series::new(columns::AREA.into(), &[self.area]).into(),
            Series::new(columns::BEDROOMS.into(), &[self.bedrooms]).into(),
            Series::new(columns::BATHROOMS.into(), &[self.bathrooms]).into(),
            Series::new(columns::PROPERTY_TYPE.into(), &[self.property_type.as_str()]).into(),
            Series::new(columns::AMENITIES.into(), &[self.amenities.as_str()]).into(),
            Series::new(
                columns::NEARBY_FACILITY.into(),
                &[self.nearby_facility.as_str()],
            )
            .into(),
        ])
        .map_err(|e| HomevalError::DataError(e.to_string()))
    }
}

/// Render a price with thousands separators, rounded to whole EGP.
pub fn format_thousands(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if whole < 0 {
        format!("-{out}")
    } else {
        out
    }
}

/// Generate a synthetic property frame for tests and demos. Prices are
/// formatted with thousands separators so the cleanup path is exercised,
/// and a few amenity cells are left null.
pub fn sample_dataset(n: usize, seed: u64) -> Result<DataFrame> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    const LOCATIONS: [&str; 5] = ["New Cairo", "Zamalek", "Maadi", "6th of October", "Nasr City"];
    const AMENITY_POOL: [&str; 6] = [
        "pool", "gym", "garden", "parking", "balcony", "security",
    ];
    const FACILITY_POOL: [&str; 5] = ["school", "hospital", "mall", "metro", "park"];

    let mut location = Vec::with_capacity(n);
    let mut area = Vec::with_capacity(n);
    let mut ptype = Vec::with_capacity(n);
    let mut bedrooms = Vec::with_capacity(n);
    let mut bathrooms = Vec::with_capacity(n);
    let mut amenities: Vec<Option<String>> = Vec::with_capacity(n);
    let mut facilities = Vec::with_capacity(n);
    let mut p2023 = Vec::with_capacity(n);
    let mut p2024 = Vec::with_capacity(n);
    let mut p2025 = Vec::with_capacity(n);

    for _ in 0..n {
        let is_villa = rng.gen_bool(0.3);
        let sqm: f64 = if is_villa {
            rng.gen_range(200.0..500.0)
        } else {
            rng.gen_range(70.0..220.0)
        };
        let beds = rng.gen_range(1..=5i64);
        let baths = rng.gen_range(1..=3i64);

        let amenity = if rng.gen_bool(0.15) {
            None
        } else {
            let count = rng.gen_range(1..=3);
            let mut picked: Vec<&str> = Vec::new();
            while picked.len() < count {
                let candidate = AMENITY_POOL[rng.gen_range(0..AMENITY_POOL.len())];
                if !picked.contains(&candidate) {
                    picked.push(candidate);
                }
            }
            Some(picked.join(" "))
        };
        let facility = {
            let count = rng.gen_range(1..=2);
            let mut picked: Vec<&str> = Vec::new();
            while picked.len() < count {
                let candidate = FACILITY_POOL[rng.gen_range(0..FACILITY_POOL.len())];
                if !picked.contains(&candidate) {
                    picked.push(candidate);
                }
            }
            picked.join(" ")
        };

        let per_sqm = if is_villa {
            rng.gen_range(25_000.0..40_000.0)
        } else {
            rng.gen_range(15_000.0..30_000.0)
        };
        let base = sqm * per_sqm;
        let g24 = rng.gen_range(0.10..0.30);
        let g25 = rng.gen_range(0.10..0.25);

        location.push(LOCATIONS[rng.gen_range(0..LOCATIONS.len())]);
        area.push(sqm.round());
        ptype.push(if is_villa { "Villa" } else { "Apartment" });
        bedrooms.push(beds);
        bathrooms.push(baths);
        amenities.push(amenity);
        facilities.push(facility);
        p2023.push(format_thousands(base));
        p2024.push(format_thousands(base * (1.0 + g24)));
        p2025.push(format_thousands(base * (1.0 + g24) * (1.0 + g25)));
    }

    DataFrame::new(vec![
        Series::new(columns::LOCATION.into(), location).into(),
        Series::new(columns::AREA.into(), area).into(),
        Series::new(columns::PROPERTY_TYPE.into(), ptype).into(),
        Series::new(columns::BEDROOMS.into(), bedrooms).into(),
        Series::new(columns::BATHROOMS.into(), bathrooms).into(),
        Series::new(columns::AMENITIES.into(), amenities).into(),
        Series::new(columns::NEARBY_FACILITY.into(), facilities).into(),
        Series::new(columns::PRICE_2023.into(), p2023).into(),
        Series::new(columns::PRICE_2024.into(), p2024).into(),
        Series::new(columns::PRICE_2025.into(), p2025).into(),
    ])
    .map_err(|e| HomevalError::DataError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_strings() {
        let df = DataFrame::new(vec![Series::new(
            columns::PRICE_2023.into(),
            &["1,250,000", " 980,500 ", "not a price"],
        )
        .into()])
        .unwrap();

        let cleaned = clean_dataset(&df).unwrap();
        let col = cleaned.column(columns::PRICE_2023).unwrap().f64().unwrap();
        assert_eq!(col.get(0), Some(1_250_000.0));
        assert_eq!(col.get(1), Some(980_500.0));
        assert_eq!(col.get(2), None);
    }

    #[test]
    fn test_text_fill_and_encoding() {
        let df = DataFrame::new(vec![
            Series::new(columns::AMENITIES.into(), &[Some("pool gym"), None]).into(),
            Series::new(columns::PROPERTY_TYPE.into(), &["Apartment", "Villa"]).into(),
        ])
        .unwrap();

        let cleaned = clean_dataset(&df).unwrap();

        let amenities = cleaned.column(columns::AMENITIES).unwrap().str().unwrap();
        assert_eq!(amenities.get(1), Some(""));

        let encoded = cleaned
            .column(columns::PROPERTY_TYPE_ENCODED)
            .unwrap()
            .i64()
            .unwrap();
        assert_eq!(encoded.get(0), Some(0));
        assert_eq!(encoded.get(1), Some(1));
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let df = clean_dataset(&sample_dataset(20, 7).unwrap()).unwrap();
        let a = simulate_future_prices(&df, 42).unwrap();
        let b = simulate_future_prices(&df, 42).unwrap();

        let pa = a.column(columns::PRICE_2026).unwrap().f64().unwrap();
        let pb = b.column(columns::PRICE_2026).unwrap().f64().unwrap();
        for (x, y) in pa.into_iter().zip(pb.into_iter()) {
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_simulated_growth_within_bounds() {
        let df = clean_dataset(&sample_dataset(50, 3).unwrap()).unwrap();
        let sim = simulate_future_prices(&df, 42).unwrap();

        let p25 = sim.column(columns::PRICE_2025).unwrap().f64().unwrap();
        let p26 = sim.column(columns::PRICE_2026).unwrap().f64().unwrap();
        for (prev, next) in p25.into_iter().zip(p26.into_iter()) {
            let (prev, next) = (prev.unwrap(), next.unwrap());
            let growth = next / prev - 1.0;
            assert!(growth >= 0.10 && growth < 0.25, "growth {growth}");
        }
    }

    #[test]
    fn test_simulation_keeps_null_base_price_null() {
        let df = DataFrame::new(vec![Series::new(
            columns::PRICE_2023.into(),
            &[Some(1_000_000.0), None, Some(2_000_000.0)],
        )
        .into()])
        .unwrap();

        let sim = simulate_future_prices(&df, 42).unwrap();
        for name in [columns::PRICE_2024, columns::PRICE_2025, columns::PRICE_2026] {
            let col = sim.column(name).unwrap().f64().unwrap();
            assert!(col.get(0).is_some());
            assert_eq!(col.get(1), None);
            assert!(col.get(2).is_some());
        }
    }

    #[test]
    fn test_property_row_round_trip() {
        let df = clean_dataset(&sample_dataset(5, 11).unwrap()).unwrap();
        let row = PropertyRow::from_frame(&df, 2).unwrap();
        let frame = row.to_frame().unwrap();
        assert_eq!(frame.height(), 1);
        assert_eq!(
            frame
                .column(columns::PRICE_2025)
                .unwrap()
                .f64()
                .unwrap()
                .get(0),
            Some(row.price_2025)
        );
    }

    #[test]
    fn test_property_row_out_of_range() {
        let df = clean_dataset(&sample_dataset(3, 11).unwrap()).unwrap();
        assert!(PropertyRow::from_frame(&df, 99).is_err());
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(1_250_000.0), "1,250,000");
        assert_eq!(format_thousands(980.0), "980");
    }
}
