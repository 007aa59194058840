use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorQuery {
    /// Device to query; all devices when absent
    pub device_id: Option<String>,
    /// Return the recent window instead of the latest reading
    #[serde(default)]
    pub historical: bool,
}

/// Body of `POST /sensors`. Only `deviceId` and `aqi` are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReadingRequest {
    pub device_id: Option<String>,
    pub aqi: Option<f64>,
    pub co2: Option<f64>,
    pub pm25: Option<f64>,
    pub voc: Option<f64>,
    pub co: Option<f64>,
    pub no2: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub location: Option<String>,
}
