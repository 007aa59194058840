use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tokio::net::TcpListener;
use tower::ServiceExt;

use airsight_api::models::Reading;
use airsight_server::app::create_app;
use airsight_server::configs::{Backend, SchemaManager, Settings, Storage};

pub struct MockApp {
    pub storage: Arc<Storage>,
    pub settings: Settings,
    pub router: Router,
}

impl MockApp {
    pub async fn new() -> Self {
        Self::with_backend(Backend::Sqlite).await
    }

    pub async fn with_backend(backend: Backend) -> Self {
        let mut settings = Settings::defaults().unwrap();
        settings.database.backend = backend;
        settings.database.url = String::from("sqlite::memory:");
        settings.database.clean_start = true;
        settings.database.migration_path = None;

        let storage = Arc::new(
            Storage::connect(&settings.database, SchemaManager::default())
                .await
                .unwrap(),
        );
        let router = create_app(&settings, storage.clone());

        Self {
            storage,
            settings,
            router,
        }
    }

    pub async fn create_test_reading(&self, device_id: &str, minutes_ago: i64, aqi: f64) -> Reading {
        let timestamp = OffsetDateTime::now_utc() - Duration::minutes(minutes_ago);
        let reading = Reading {
            id: Reading::make_id(device_id, timestamp),
            device_id: device_id.to_string(),
            timestamp,
            aqi,
            co2: 480.0,
            pm25: 11.0,
            voc: 0.25,
            co: 4.0,
            no2: 22.0,
            temperature: 23.5,
            humidity: 48.0,
            location: String::from("Test Room"),
        };

        self.storage.save(&reading).await.unwrap();

        reading
    }

    /// Serves the router on an ephemeral local port and returns its base url.
    pub async fn serve(&self) -> String {
        serve_router(self.router.clone()).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .method(Method::GET)
            .body(Body::empty())
            .unwrap();

        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: impl Into<String>) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .method(Method::POST)
            .header("Content-Type", "application/json")
            .body(Body::from(body.into()))
            .unwrap();

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, body)
    }
}

pub async fn serve_router(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{address}")
}
