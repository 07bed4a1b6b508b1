//! Integration test: server endpoints

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use homeval::data::sample_dataset;
use homeval::model::{PriceEstimator, TrainingConfig};
use homeval::server::{create_router, AppState, ServerConfig};

fn test_app() -> axum::Router {
    let raw = sample_dataset(40, 9).unwrap();
    let mut estimator = PriceEstimator::new(TrainingConfig::default());
    estimator.train(&raw).unwrap();
    let prepared = estimator.prepare(&raw).unwrap();

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        data_path: "/tmp/homeval-test/properties.csv".to_string(),
        model_path: "/tmp/homeval-test/model.json".to_string(),
    };
    let state = Arc::new(AppState::new(config, estimator, prepared));
    create_router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model_trained"], true);
    assert_eq!(json["dataset_rows"], 40);
}

#[tokio::test]
async fn test_root_serves_property_page() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("Property Estimator"));
    assert!(html.contains("name=\"row_index\""));
    assert!(!html.contains("{{"));
}

#[tokio::test]
async fn test_form_predict_shows_price() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("row_index=3"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("Predicted 2026 Price"));
    assert!(html.contains("value=\"3\""));
}

#[tokio::test]
async fn test_form_predict_bad_row_index() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("row_index=9999"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_predict_with_dataset_keys() {
    let app = test_app();
    let payload = serde_json::json!({
        "Price 2023 (EGP)": 2_000_000.0,
        "Price 2024 (EGP)": 2_400_000.0,
        "Price 2025 (EGP)": 2_800_000.0,
        "Area (sqm)": 150.0,
        "Bedrooms": 3,
        "Bathrooms": 2,
        "Property Type": "Apartment",
        "Amenities": "pool gym",
        "Nearby Facility": "school mall"
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let predicted = json["predicted_price"].as_i64().unwrap();
    assert!(predicted > 0, "predicted_price = {predicted}");
}

#[tokio::test]
async fn test_api_predict_with_camel_case_keys() {
    let app = test_app();
    let payload = serde_json::json!({
        "price2023": 2_000_000.0,
        "price2024": 2_400_000.0,
        "price2025": 2_800_000.0,
        "area": 300.0,
        "bedrooms": 4,
        "bathrooms": 3,
        "propertyType": "Villa",
        "amenities": "garden security",
        "nearbyFacilities": "park"
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["predicted_price"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_api_predict_missing_fields_is_400() {
    let app = test_app();
    let payload = serde_json::json!({ "price2023": 1.0 });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
}

#[tokio::test]
async fn test_api_predict_non_json_body_is_400() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header("content-type", "application/json")
                .body(Body::from("this is not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert!(json["message"].as_str().unwrap().contains("invalid property payload"));
}

#[tokio::test]
async fn test_api_predict_missing_content_type_is_400() {
    let app = test_app();
    let payload = serde_json::json!({ "price2023": 1.0 });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nonsense")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
}

#[tokio::test]
async fn test_predict_wrong_method_is_405() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/predict")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
