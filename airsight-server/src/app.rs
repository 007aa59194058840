use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::{Settings, Storage};
use crate::handles::*;
use crate::services::DeviceDirectory;

pub fn create_app(settings: &Settings, storage: Arc<Storage>) -> Router {
    let directory = Arc::new(DeviceDirectory::new(storage.clone(), &settings.directory));

    let sensor = Router::new()
        .route("/", get(get_sensor_data).post(create_sensor_data))
        .route("/realtime", get(get_realtime_data))
        .route("/stream", get(stream_sensor_data))
        .with_state(SensorState {
            storage: storage.clone(),
            sensors: settings.sensors.clone(),
        });

    let device = Router::new()
        .route("/", get(get_devices))
        .with_state(DeviceState { directory });

    Router::new()
        .nest("/sensors", sensor)
        .nest("/devices", device)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
