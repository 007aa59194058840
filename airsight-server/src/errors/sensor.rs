use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("No data found for device {0}")]
    NotFound(String),

    #[error("No data found for device {device_id} in the last {hours} hours")]
    NoRecentData { device_id: String, hours: i64 },

    #[error("No sensor data found")]
    NoData,

    #[error("Missing required fields: deviceId, aqi")]
    MissingFields,

    #[error("Missing required parameter: deviceId")]
    MissingDevice,

    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl SensorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SensorError::NotFound(_) => StatusCode::NOT_FOUND,
            SensorError::NoRecentData { .. } => StatusCode::NOT_FOUND,
            SensorError::NoData => StatusCode::NOT_FOUND,
            SensorError::MissingFields => StatusCode::BAD_REQUEST,
            SensorError::MissingDevice => StatusCode::BAD_REQUEST,
            SensorError::InvalidReading(_) => StatusCode::BAD_REQUEST,
            SensorError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Explanation shown next to the short error.
    pub fn message(&self) -> &'static str {
        match self {
            SensorError::NotFound(_) => "No readings have been stored for this device",
            SensorError::NoRecentData { .. } => "The device has not reported within the history window",
            SensorError::NoData => "No readings have been stored yet",
            SensorError::MissingFields | SensorError::MissingDevice => "Check the request and try again",
            SensorError::InvalidReading(_) => "The reading was rejected",
            SensorError::InvalidBody(_) => "The request body is not valid JSON for a reading",
        }
    }
}
