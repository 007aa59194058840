use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use airsight_api::models::{Device, DeviceListing};
use time::{Duration, OffsetDateTime};

use crate::configs::{Directory, Storage};
use crate::models::ReadingRecord;

pub const FALLBACK_MESSAGE: &str = "Using fallback device data due to database error";
pub const EMPTY_MESSAGE: &str = "No device has reported yet, showing sample devices";

/// Builds the device list from the newest stored readings.
pub struct DeviceDirectory {
    storage: Arc<Storage>,
    sample_size: usize,
    staleness: Duration,
}

impl DeviceDirectory {
    pub fn new(storage: Arc<Storage>, directory: &Directory) -> Self {
        Self {
            storage,
            sample_size: directory.sample_size,
            staleness: Duration::minutes(directory.staleness_minutes),
        }
    }

    pub async fn list(&self) -> DeviceListing {
        self.list_at(OffsetDateTime::now_utc()).await
    }

    /// Never fails; storage errors and an empty store both yield the placeholder list.
    pub async fn list_at(&self, now: OffsetDateTime) -> DeviceListing {
        match self.storage.recent(None, self.sample_size).await {
            Ok(records) if records.is_empty() => {
                tracing::info!("no readings stored, serving placeholder devices");
                DeviceListing::placeholder(now, EMPTY_MESSAGE)
            }
            Ok(records) => {
                let devices = summarize(records, now, self.staleness);
                tracing::debug!("devices summarized: {}", devices.len());
                DeviceListing::live(devices)
            }
            Err(e) => {
                tracing::error!("failed to load devices: {}", e);
                DeviceListing::placeholder(now, FALLBACK_MESSAGE)
            }
        }
    }
}

/// One device per id, described by its newest reading, sorted by id.
///
/// Readings with equal timestamps are ordered by storage sequence, so the
/// later insert wins.
pub fn summarize(
    records: impl IntoIterator<Item = ReadingRecord>,
    now: OffsetDateTime,
    staleness: Duration,
) -> Vec<Device> {
    let mut latest: BTreeMap<String, ReadingRecord> = BTreeMap::new();

    for record in records {
        match latest.entry(record.reading.device_id.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(record);
            }
            Entry::Occupied(mut entry) => {
                let current = entry.get();
                if (record.reading.timestamp, record.seq) > (current.reading.timestamp, current.seq) {
                    entry.insert(record);
                }
            }
        }
    }

    latest
        .values()
        .map(|record| Device::from_latest(&record.reading, now, staleness))
        .collect()
}

#[cfg(test)]
mod tests {
    use airsight_api::models::{DataSource, DeviceStatus, Reading};
    use time::macros::datetime;

    use super::*;
    use crate::configs::{Backend, Database, SchemaManager};

    fn record(seq: i64, device_id: &str, timestamp: OffsetDateTime, aqi: f64) -> ReadingRecord {
        ReadingRecord {
            seq,
            reading: Reading {
                id: Reading::make_id(device_id, timestamp),
                device_id: device_id.to_string(),
                timestamp,
                aqi,
                co2: 0.0,
                pm25: 0.0,
                voc: 0.0,
                co: 0.0,
                no2: 0.0,
                temperature: 20.0,
                humidity: 40.0,
                location: String::new(),
            },
        }
    }

    async fn memory_directory() -> (Arc<Storage>, DeviceDirectory) {
        let database = Database {
            backend: Backend::Memory,
            url: String::new(),
            clean_start: false,
            migration_path: None,
        };
        let storage = Arc::new(Storage::connect(&database, SchemaManager::default()).await.unwrap());
        let directory = DeviceDirectory::new(
            storage.clone(),
            &Directory {
                sample_size: 50,
                staleness_minutes: 10,
            },
        );

        (storage, directory)
    }

    #[test]
    fn test_summarize_keeps_newest_per_device() {
        let now = datetime!(2024-05-01 12:00 UTC);
        let records = vec![
            record(1, "A", now - Duration::minutes(2), 10.0),
            record(2, "B", now - Duration::minutes(30), 20.0),
            record(3, "A", now - Duration::minutes(1), 30.0),
        ];

        let devices = summarize(records, now, Duration::minutes(10));

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].id, "A");
        assert_eq!(devices[0].last_aqi, 30.0);
        assert_eq!(devices[0].status, DeviceStatus::Online);
        assert_eq!(devices[1].id, "B");
        assert_eq!(devices[1].status, DeviceStatus::Offline);
    }

    #[test]
    fn test_summarize_ties_go_to_later_insert() {
        let now = datetime!(2024-05-01 12:00 UTC);
        let at = now - Duration::minutes(1);
        let records = vec![record(9, "A", at, 90.0), record(4, "A", at, 40.0)];

        let devices = summarize(records, now, Duration::minutes(10));

        assert_eq!(devices[0].last_aqi, 90.0);
    }

    #[tokio::test]
    async fn test_list_from_storage() {
        let (storage, directory) = memory_directory().await;
        let now = OffsetDateTime::now_utc();

        for (device_id, minutes_ago, aqi) in [("A", 5, 10.0), ("B", 3, 20.0), ("A", 1, 30.0)] {
            let record = record(0, device_id, now - Duration::minutes(minutes_ago), aqi);
            storage.save(&record.reading).await.unwrap();
        }

        let listing = directory.list_at(now).await;

        assert_eq!(listing.source, DataSource::Live);
        let ids: Vec<_> = listing.devices.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
        assert_eq!(listing.devices[0].last_aqi, 30.0);
    }

    #[tokio::test]
    async fn test_empty_store_yields_placeholder() {
        let (_storage, directory) = memory_directory().await;

        let listing = directory.list().await;

        assert!(listing.is_placeholder());
        assert_eq!(listing.message.as_deref(), Some(EMPTY_MESSAGE));
    }

    #[tokio::test]
    async fn test_storage_failure_yields_placeholder() {
        let (storage, directory) = memory_directory().await;
        storage.close().await;

        let listing = directory.list().await;

        assert!(listing.is_placeholder());
        assert_eq!(listing.message.as_deref(), Some(FALLBACK_MESSAGE));
        let ids: Vec<_> = listing.devices.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["Esp_353", "Esp_355", "esp32_001"]);
        assert!(listing.devices.iter().all(|d| !d.is_online()));
    }
}
