use std::fmt;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use super::{DataSource, Reading};

pub const DEFAULT_MODEL: &str = "ESP32-DevKit";
pub const DEFAULT_FIRMWARE: &str = "v1.2.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceStatus::Online => write!(f, "online"),
            DeviceStatus::Offline => write!(f, "offline"),
        }
    }
}

/// A known sensor endpoint, derived from its most recent reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub location: String,
    pub status: DeviceStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen: OffsetDateTime,
    pub model: String,
    pub firmware: String,
    #[serde(rename = "lastAQI")]
    pub last_aqi: f64,
    pub last_temperature: f64,
    pub last_humidity: f64,
}

impl Device {
    /// Describes the device that reported `latest`, online when that reading
    /// is no older than `staleness` at `now`.
    pub fn from_latest(latest: &Reading, now: OffsetDateTime, staleness: Duration) -> Self {
        let status = if now - latest.timestamp <= staleness {
            DeviceStatus::Online
        } else {
            DeviceStatus::Offline
        };

        let display_id = display_name(&latest.device_id);
        let (name, location) = if latest.location.is_empty() {
            (format!("{display_id} Sensor"), format!("{display_id} Location"))
        } else {
            (latest.location.clone(), latest.location.clone())
        };

        Self {
            id: latest.device_id.clone(),
            name,
            location,
            status,
            last_seen: latest.timestamp,
            model: DEFAULT_MODEL.to_string(),
            firmware: DEFAULT_FIRMWARE.to_string(),
            last_aqi: latest.aqi,
            last_temperature: latest.temperature,
            last_humidity: latest.humidity,
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == DeviceStatus::Online
    }
}

/// Human facing form of a device id, `Esp_353` reads as `ESP32_353`.
pub fn display_name(device_id: &str) -> String {
    device_id.replacen("Esp_", "ESP32_", 1)
}

/// Fixed stand-in device list served while no real directory is available.
///
/// Ids and values never change; only `lastSeen` is relative to `now`.
pub fn placeholder_devices(now: OffsetDateTime) -> Vec<Device> {
    let entries = [
        ("Esp_353", "Kitchen Sensor", "Kitchen", 45, 38.0, 24.0, 48.0),
        ("Esp_355", "Bedroom Sensor", "Bedroom", 20, 32.0, 21.8, 52.0),
        ("esp32_001", "Living Room Sensor", "Living Room", 30, 45.0, 22.5, 55.0),
    ];

    entries
        .into_iter()
        .map(|(id, name, location, minutes_ago, aqi, temperature, humidity)| Device {
            id: id.to_string(),
            name: name.to_string(),
            location: location.to_string(),
            status: DeviceStatus::Offline,
            last_seen: now - Duration::minutes(minutes_ago),
            model: DEFAULT_MODEL.to_string(),
            firmware: DEFAULT_FIRMWARE.to_string(),
            last_aqi: aqi,
            last_temperature: temperature,
            last_humidity: humidity,
        })
        .collect()
}

/// A device list together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceListing {
    pub devices: Vec<Device>,
    pub source: DataSource,
    /// Why placeholder data is served, if it is
    pub message: Option<String>,
}

impl DeviceListing {
    pub fn live(devices: Vec<Device>) -> Self {
        Self {
            devices,
            source: DataSource::Live,
            message: None,
        }
    }

    /// The fixed placeholder list, tagged so callers can tell it from real data.
    pub fn placeholder(now: OffsetDateTime, message: impl Into<String>) -> Self {
        Self {
            devices: placeholder_devices(now),
            source: DataSource::Placeholder,
            message: Some(message.into()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == DataSource::Placeholder
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn reading_at(timestamp: OffsetDateTime, location: &str) -> Reading {
        Reading {
            id: String::new(),
            device_id: "Esp_353".into(),
            timestamp,
            aqi: 42.0,
            co2: 500.0,
            pm25: 10.0,
            voc: 0.3,
            co: 5.0,
            no2: 30.0,
            temperature: 22.0,
            humidity: 50.0,
            location: location.into(),
        }
    }

    #[test]
    fn test_status_uses_staleness_window() {
        let now = datetime!(2024-05-01 12:00 UTC);
        let window = Duration::minutes(10);

        let fresh = Device::from_latest(&reading_at(now - Duration::minutes(10), "Kitchen"), now, window);
        assert_eq!(fresh.status, DeviceStatus::Online);
        assert_eq!(fresh.name, "Kitchen");

        let stale = Device::from_latest(&reading_at(now - Duration::minutes(11), ""), now, window);
        assert_eq!(stale.status, DeviceStatus::Offline);
        assert_eq!(stale.name, "ESP32_353 Sensor");
        assert_eq!(stale.location, "ESP32_353 Location");
    }

    #[test]
    fn test_placeholder_devices_are_fixed() {
        let now = datetime!(2024-05-01 12:00 UTC);
        let devices = placeholder_devices(now);

        let ids: Vec<_> = devices.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["Esp_353", "Esp_355", "esp32_001"]);
        assert!(devices.iter().all(|d| !d.is_online()));
        assert_eq!(devices[0].last_seen, now - Duration::minutes(45));
    }

    #[test]
    fn test_device_wire_names() {
        let now = datetime!(2024-05-01 12:00 UTC);
        let value = serde_json::to_value(&placeholder_devices(now)[0]).unwrap();

        assert_eq!(value["lastAQI"], serde_json::json!(38.0));
        assert_eq!(value["status"], serde_json::json!("offline"));
        assert!(value.get("lastSeen").is_some());
    }
}
