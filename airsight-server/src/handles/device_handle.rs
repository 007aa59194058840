use std::sync::Arc;

use airsight_api::restful::ApiResponse;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::services::DeviceDirectory;

#[derive(Clone)]
pub struct DeviceState {
    pub directory: Arc<DeviceDirectory>,
}

pub async fn get_devices(State(state): State<DeviceState>) -> impl IntoResponse {
    let listing = state.directory.list().await;

    let mut body = ApiResponse::ok(listing.devices).with_source(listing.source);
    if let Some(message) = listing.message {
        body = body.with_message(message);
    }

    Json(body)
}
