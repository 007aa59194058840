use std::convert::Infallible;
use std::sync::Arc;

use airsight_api::models::{DataSource, Reading, SensorData, display_name};
use airsight_api::restful::{ApiResponse, CreateReadingRequest, SensorQuery};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive};
use axum::response::{IntoResponse, Sse};
use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tokio::time::interval;
use tokio_stream::{Stream, StreamExt, wrappers};

use crate::configs::{Sensors, Storage};
use crate::errors::{ApiError, SensorError};
use crate::services::simulate;

#[derive(Clone)]
pub struct SensorState {
    pub storage: Arc<Storage>,
    pub sensors: Sensors,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceQuery {
    pub device_id: Option<String>,
}

pub async fn get_sensor_data(
    State(state): State<SensorState>,
    Query(query): Query<SensorQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let now = OffsetDateTime::now_utc();
    let device_id = query.device_id.filter(|id| !id.is_empty());

    let data = match device_id {
        Some(device_id) if state.sensors.demo_device.as_deref() == Some(device_id.as_str()) => {
            tracing::debug!("serving mock data for demo device {}", device_id);

            let reading = simulate::demo_reading(&device_id, now);
            let data = if query.historical {
                SensorData::Historical(vec![reading])
            } else {
                SensorData::Current(reading)
            };

            let body = ApiResponse::ok(data)
                .with_source(DataSource::Mock)
                .with_message("Mock data for demonstration");
            return Ok(Json(body));
        }
        Some(device_id) if query.historical => {
            let hours = state.sensors.history_hours;
            let records = state.storage.range(&device_id, now - Duration::hours(hours)).await?;
            if records.is_empty() {
                return Err(SensorError::NoRecentData { device_id, hours }.into());
            }

            SensorData::Historical(records.into_iter().map(|record| record.reading).collect())
        }
        Some(device_id) => {
            let record = state.storage.latest(&device_id).await?.ok_or(SensorError::NotFound(device_id))?;

            SensorData::Current(record.reading)
        }
        None => {
            let records = state.storage.recent(None, state.sensors.recent_limit).await?;
            if records.is_empty() {
                return Err(SensorError::NoData.into());
            }

            SensorData::Historical(records.into_iter().map(|record| record.reading).collect())
        }
    };

    Ok(Json(ApiResponse::ok(data)))
}

pub async fn create_sensor_data(
    State(state): State<SensorState>,
    payload: Result<Json<CreateReadingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|e| SensorError::InvalidBody(e.body_text()))?;
    let reading = build_reading(body, OffsetDateTime::now_utc())?;

    let id = state.storage.save(&reading).await?;
    tracing::info!("sensor data saved: {}", id);

    Ok(Json(ApiResponse::created(id, "Sensor data saved successfully")))
}

pub async fn get_realtime_data(
    State(state): State<SensorState>,
    Query(query): Query<DeviceQuery>,
) -> impl IntoResponse {
    let device_id = query
        .device_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| state.sensors.realtime_device.clone());
    let reading = simulate::realtime_reading(&device_id, OffsetDateTime::now_utc());

    Json(
        ApiResponse::ok(SensorData::Current(reading))
            .with_source(DataSource::Mock)
            .with_message("Simulated realtime data"),
    )
}

/// Pushes the latest reading of a device every time it changes.
pub async fn stream_sensor_data(
    State(state): State<SensorState>,
    Query(query): Query<DeviceQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let device_id = query
        .device_id
        .filter(|id| !id.is_empty())
        .ok_or(SensorError::MissingDevice)?;
    let period = std::time::Duration::from_secs(state.sensors.stream_interval_secs.max(1));
    let mut last_id: Option<String> = None;

    let stream = wrappers::IntervalStream::new(interval(period))
        .then(move |_| {
            let storage = Arc::clone(&state.storage);
            let device_id = device_id.clone();
            async move { storage.latest(&device_id).await }
        })
        .filter_map(move |result| match result {
            Ok(Some(record)) if last_id.as_deref() != Some(record.reading.id.as_str()) => {
                match Event::default().event("reading").json_data(&record.reading) {
                    Ok(event) => {
                        last_id = Some(record.reading.id);
                        Some(Ok(event))
                    }
                    Err(e) => {
                        tracing::error!("failed to encode reading event: {}", e);
                        None
                    }
                }
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("stream lookup failed: {}", e);
                Some(Ok(Event::default().event("error").data("Unable to read from the storage backend")))
            }
        });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Validates a posted reading and fills the optional fields.
fn build_reading(body: CreateReadingRequest, now: OffsetDateTime) -> Result<Reading, SensorError> {
    let device_id = body.device_id.filter(|id| !id.trim().is_empty());
    let (Some(device_id), Some(aqi)) = (device_id, body.aqi) else {
        return Err(SensorError::MissingFields);
    };

    if !aqi.is_finite() || aqi < 0.0 {
        return Err(SensorError::InvalidReading(format!("aqi must be a non-negative number, got {aqi}")));
    }

    let location = body
        .location
        .filter(|location| !location.is_empty())
        .unwrap_or_else(|| format!("{} Location", display_name(&device_id)));

    Ok(Reading {
        id: Reading::make_id(&device_id, now),
        device_id,
        timestamp: now,
        aqi,
        co2: body.co2.unwrap_or_default(),
        pm25: body.pm25.unwrap_or_default(),
        voc: body.voc.unwrap_or_default(),
        co: body.co.unwrap_or_default(),
        no2: body.no2.unwrap_or_default(),
        temperature: body.temperature.unwrap_or_default(),
        humidity: body.humidity.unwrap_or_default(),
        location,
    })
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn request(device_id: Option<&str>, aqi: Option<f64>) -> CreateReadingRequest {
        CreateReadingRequest {
            device_id: device_id.map(String::from),
            aqi,
            ..Default::default()
        }
    }

    #[test]
    fn test_build_reading_defaults() {
        let now = datetime!(2024-05-01 10:00 UTC);
        let reading = build_reading(request(Some("Esp_353"), Some(42.0)), now).unwrap();

        assert_eq!(reading.id, "Esp_353_1714557600000");
        assert_eq!(reading.location, "ESP32_353 Location");
        assert_eq!(reading.co2, 0.0);
        assert_eq!(reading.timestamp, now);
    }

    #[test]
    fn test_build_reading_rejects_invalid() {
        let now = datetime!(2024-05-01 10:00 UTC);

        assert!(matches!(build_reading(request(None, Some(1.0)), now), Err(SensorError::MissingFields)));
        assert!(matches!(build_reading(request(Some(" "), Some(1.0)), now), Err(SensorError::MissingFields)));
        assert!(matches!(build_reading(request(Some("Esp_353"), None), now), Err(SensorError::MissingFields)));
        assert!(matches!(
            build_reading(request(Some("Esp_353"), Some(-1.0)), now),
            Err(SensorError::InvalidReading(_))
        ));
        assert!(build_reading(request(Some("Esp_353"), Some(0.0)), now).is_ok());
    }
}
