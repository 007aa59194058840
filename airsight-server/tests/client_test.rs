use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::routing::get;
use serde_json::json;

use airsight_api::models::{DataSource, SensorData};
use airsight_client::{
    FetchError, FetchPhase, FetcherOptions, HttpTransport, ReadingFetcher, SensorTransport, load_devices,
};

mod common;
use common::mock_app::{MockApp, serve_router};

fn transport(base_url: String) -> HttpTransport {
    HttpTransport::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_unknown_device_is_not_found() {
    let app = MockApp::new().await;
    let transport = transport(app.serve().await);

    let result = transport.fetch_readings("ghost", false).await;

    assert_eq!(result, Err(FetchError::NotFound(String::from("No data found for device ghost"))));
}

#[tokio::test]
async fn test_current_and_historical_readings() {
    let app = MockApp::new().await;
    app.create_test_reading("Esp_353", 30, 35.0).await;
    app.create_test_reading("Esp_353", 5, 42.0).await;
    let transport = transport(app.serve().await);

    let current = transport.fetch_readings("Esp_353", false).await.unwrap();
    assert!(matches!(&current, SensorData::Current(reading) if reading.aqi == 42.0));

    let history = transport.fetch_readings("Esp_353", true).await.unwrap();
    match history {
        SensorData::Historical(readings) => {
            let aqis: Vec<f64> = readings.iter().map(|r| r.aqi).collect();
            assert_eq!(aqis, [35.0, 42.0]);
        }
        SensorData::Current(_) => panic!("expected a historical window"),
    }
}

#[tokio::test]
async fn test_fetcher_over_http() {
    let app = MockApp::new().await;
    app.create_test_reading("Esp_353", 1, 42.0).await;
    let transport = Arc::new(transport(app.serve().await));

    let options = FetcherOptions {
        auto_refresh: false,
        ..FetcherOptions::new("Esp_353")
    };
    let fetcher = ReadingFetcher::spawn(transport, options);
    let mut updates = fetcher.subscribe();

    let state = updates.wait_for(|s| s.phase != FetchPhase::Loading && s.phase != FetchPhase::Idle).await.unwrap().clone();

    assert_eq!(state.phase, FetchPhase::Ready);
    assert!(state.is_connected);
    assert_eq!(state.reading().map(|r| r.aqi), Some(42.0));

    fetcher.shutdown().await;
}

#[tokio::test]
async fn test_closed_store_is_backend_failure() {
    let app = MockApp::new().await;
    app.create_test_reading("Esp_353", 1, 42.0).await;
    let transport = transport(app.serve().await);

    let listing = load_devices(&transport).await;
    assert_eq!(listing.source, DataSource::Live);
    assert_eq!(listing.devices.len(), 1);

    app.storage.close().await;

    let result = transport.fetch_readings("Esp_353", false).await;
    assert!(matches!(&result, Err(FetchError::Backend(detail)) if detail.contains("Database query failed")));

    let listing = load_devices(&transport).await;
    assert!(listing.is_placeholder());
    assert_eq!(listing.message.as_deref(), Some("Using fallback device data due to database error"));
}

#[tokio::test]
async fn test_unexpected_bodies() {
    let malformed = transport(serve_router(Router::new().route("/sensors", get(|| async { "not json" }))).await);
    let result = malformed.fetch_readings("X", false).await;
    assert!(matches!(result, Err(FetchError::Malformed(_))));

    let empty = transport(
        serve_router(Router::new().route("/sensors", get(|| async { Json(json!({ "success": true })) }))).await,
    );
    let result = empty.fetch_readings("X", false).await;
    assert_eq!(result, Err(FetchError::EmptyResult(String::from("X"))));

    let refused = transport(
        serve_router(Router::new().route(
            "/sensors",
            get(|| async { Json(json!({ "success": false, "error": "maintenance" })) }),
        ))
        .await,
    );
    let result = refused.fetch_readings("X", false).await;
    assert_eq!(result, Err(FetchError::Backend(String::from("maintenance"))));
}
