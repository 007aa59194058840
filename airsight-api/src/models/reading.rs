use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One sensor sample covering the AQI and the raw pollutant concentrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Storage key, `<deviceId>_<epochMillis>`; empty until persisted
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub device_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Air quality index, never negative
    pub aqi: f64,
    /// Carbon dioxide in ppm
    pub co2: f64,
    /// Fine particulate matter in µg/m³
    pub pm25: f64,
    /// Volatile organic compounds in mg/m³
    pub voc: f64,
    /// Carbon monoxide in ppm
    pub co: f64,
    /// Nitrogen dioxide in ppb
    pub no2: f64,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity %
    pub humidity: f64,
    #[serde(default)]
    pub location: String,
}

impl Reading {
    /// Builds the storage key for a reading of `device_id` taken at `timestamp`.
    pub fn make_id(device_id: &str, timestamp: OffsetDateTime) -> String {
        format!("{}_{}", device_id, epoch_millis(timestamp))
    }

    pub fn epoch_millis(&self) -> i64 {
        epoch_millis(self.timestamp)
    }
}

fn epoch_millis(timestamp: OffsetDateTime) -> i64 {
    (timestamp.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Payload of a sensors query: the current reading or a historical window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorData {
    Current(Reading),
    Historical(Vec<Reading>),
}

impl SensorData {
    /// The most recent reading carried by this payload.
    pub fn latest(&self) -> Option<&Reading> {
        match self {
            SensorData::Current(reading) => Some(reading),
            SensorData::Historical(readings) => readings.iter().max_by_key(|r| r.timestamp),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SensorData::Current(_) => false,
            SensorData::Historical(readings) => readings.is_empty(),
        }
    }
}
