//! Request handlers: the demo page and the JSON prediction endpoint

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    response::Html,
    Form, Json,
};
use serde::Deserialize;
use tracing::info;

use crate::data::{format_thousands, PropertyRow};

use super::error::{Result, ServerError};
use super::state::AppState;

// ============================================================================
// JSON API
// ============================================================================

/// A property to price. Fields accept either the dataset column headers
/// or the camelCase keys the upstream service sends.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(rename = "Price 2023 (EGP)", alias = "price2023")]
    pub price_2023: f64,
    #[serde(rename = "Price 2024 (EGP)", alias = "price2024")]
    pub price_2024: f64,
    #[serde(rename = "Price 2025 (EGP)", alias = "price2025")]
    pub price_2025: f64,
    #[serde(rename = "Area (sqm)", alias = "area")]
    pub area: f64,
    #[serde(rename = "Bedrooms", alias = "bedrooms")]
    pub bedrooms: f64,
    #[serde(rename = "Bathrooms", alias = "bathrooms")]
    pub bathrooms: f64,
    #[serde(rename = "Property Type", alias = "propertyType")]
    pub property_type: String,
    #[serde(rename = "Amenities", alias = "amenities", default)]
    pub amenities: Option<String>,
    #[serde(
        rename = "Nearby Facility",
        alias = "nearbyFacilities",
        alias = "nearbyFacility",
        default
    )]
    pub nearby_facility: Option<String>,
}

impl From<PredictRequest> for PropertyRow {
    fn from(req: PredictRequest) -> Self {
        Self {
            area: req.area,
            bedrooms: req.bedrooms,
            bathrooms: req.bathrooms,
            property_type: req.property_type,
            amenities: req.amenities.unwrap_or_default(),
            nearby_facility: req.nearby_facility.unwrap_or_default(),
            price_2023: req.price_2023,
            price_2024: req.price_2024,
            price_2025: req.price_2025,
        }
    }
}

pub async fn api_predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>> {
    // deserialize by hand so every malformed body gets our 400 JSON shape,
    // not the Json extractor's 415/422 rejections
    let request: PredictRequest = serde_json::from_slice(&body)
        .map_err(|e| ServerError::BadRequest(format!("invalid property payload: {e}")))?;

    let row = PropertyRow::from(request);
    let estimator = state.estimator.read().await;
    let predicted = estimator.predict_row(&row)?;

    info!(predicted_price = predicted.round() as i64, "API prediction served");
    Ok(Json(serde_json::json!({
        "predicted_price": predicted.round() as i64,
    })))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let estimator = state.estimator.read().await;
    let dataset = state.dataset.read().await;
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model_trained": estimator.is_trained(),
        "dataset_rows": dataset.height(),
    }))
}

// ============================================================================
// Web Page
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PredictForm {
    pub row_index: usize,
}

pub async fn home_page(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    let row_index = state.random_row_index().await?;
    let row = state.row(row_index).await?;
    Ok(Html(render_page(&row, row_index, None)))
}

pub async fn predict_page(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PredictForm>,
) -> Result<Html<String>> {
    let row = state.row(form.row_index).await?;
    let estimator = state.estimator.read().await;
    let predicted = estimator.predict_row(&row)?;

    info!(row_index = form.row_index, predicted_price = predicted.round() as i64, "Page prediction served");
    Ok(Html(render_page(&row, form.row_index, Some(predicted))))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_page(row: &PropertyRow, row_index: usize, prediction: Option<f64>) -> String {
    let prediction_block = match prediction {
        Some(price) => format!(
            concat!(
                "<div class=\"alert alert-info mt-4 text-center\">",
                "<h5 class=\"mb-0\">Predicted 2026 Price:</h5>",
                "<h3 class=\"text-success\">{} EGP</h3>",
                "</div>"
            ),
            format_thousands(price)
        ),
        None => String::new(),
    };

    EMBEDDED_INDEX_HTML
        .replace("{{AREA}}", &format!("{:.0}", row.area))
        .replace("{{BEDROOMS}}", &format!("{:.0}", row.bedrooms))
        .replace("{{BATHROOMS}}", &format!("{:.0}", row.bathrooms))
        .replace("{{TYPE}}", &escape_html(&row.property_type))
        .replace("{{PRICE_2025}}", &format_thousands(row.price_2025))
        .replace("{{AMENITIES}}", &escape_html(&row.amenities))
        .replace("{{FACILITIES}}", &escape_html(&row.nearby_facility))
        .replace("{{ROW_INDEX}}", &row_index.to_string())
        .replace("{{PREDICTION}}", &prediction_block)
}

// Embedded HTML for portability
const EMBEDDED_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Estimate Property Price After 1 Year</title>
    <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css" rel="stylesheet">
</head>
<body class="bg-light">
    <div class="container py-5">
        <div class="text-center mb-4">
            <h1 class="display-5">Property Estimator</h1>
            <p class="text-muted">Prediction of real estate price growth</p>
        </div>

        <div class="card shadow-lg p-4 mx-auto" style="max-width: 700px;">
            <h4 class="mb-3 text-primary">Property Details</h4>
            <ul class="list-group list-group-flush mb-4">
                <li class="list-group-item"><strong>Area:</strong> {{AREA}} sqm</li>
                <li class="list-group-item"><strong>Bedrooms:</strong> {{BEDROOMS}}</li>
                <li class="list-group-item"><strong>Bathrooms:</strong> {{BATHROOMS}}</li>
                <li class="list-group-item"><strong>Type:</strong> {{TYPE}}</li>
                <li class="list-group-item"><strong>Price:</strong> {{PRICE_2025}} EGP</li>
                <li class="list-group-item"><strong>Amenities:</strong> {{AMENITIES}}</li>
                <li class="list-group-item"><strong>Nearby Facilities:</strong> {{FACILITIES}}</li>
            </ul>

            <form method="post" action="/">
                <input type="hidden" name="row_index" value="{{ROW_INDEX}}">
                <button type="submit" class="btn btn-success w-100">Predict After 1 Year</button>
            </form>

            {{PREDICTION}}
        </div>

        <div class="text-center mt-4">
            <a href="/" class="btn btn-outline-secondary">Show Another Property</a>
        </div>
    </div>
</body>
</html>
"#;
