pub mod api;
pub mod sensor;
pub mod storage;

pub use api::ApiError;
pub use sensor::SensorError;
pub use storage::StorageError;

use airsight_api::restful::ApiResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::SensorError(e) => (
                e.status_code(),
                ApiResponse::<()>::failure(e.to_string(), e.message()),
            ),
            ApiError::StorageError(e) => {
                // Raw storage errors stay in the log, the client only gets the id
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::failure(
                        "Database query failed",
                        format!("Unable to reach the storage backend (error id: {error_id})"),
                    ),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
