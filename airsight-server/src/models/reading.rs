use airsight_api::models::Reading;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::errors::StorageError;
use crate::models::Table;

/// A stored reading together with its insertion sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRecord {
    pub seq: i64,
    pub reading: Reading,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ReadingRow {
    pub seq: i64,
    pub id: String,
    pub device_id: String,
    pub recorded_at: String,
    pub epoch_ms: i64,
    pub aqi: f64,
    pub co2: f64,
    pub pm25: f64,
    pub voc: f64,
    pub co: f64,
    pub no2: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub location: String,
}

impl TryFrom<ReadingRow> for ReadingRecord {
    type Error = StorageError;

    fn try_from(row: ReadingRow) -> Result<Self, Self::Error> {
        let timestamp = OffsetDateTime::parse(&row.recorded_at, &Rfc3339)
            .map_err(|_| StorageError::Timestamp(row.recorded_at.clone()))?;

        Ok(Self {
            seq: row.seq,
            reading: Reading {
                id: row.id,
                device_id: row.device_id,
                timestamp,
                aqi: row.aqi,
                co2: row.co2,
                pm25: row.pm25,
                voc: row.voc,
                co: row.co,
                no2: row.no2,
                temperature: row.temperature,
                humidity: row.humidity,
                location: row.location,
            },
        })
    }
}

pub struct ReadingTable;

impl Table for ReadingTable {
    fn name(&self) -> &'static str {
        "readings"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS readings (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                device_id TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                epoch_ms INTEGER NOT NULL,
                aqi REAL NOT NULL,
                co2 REAL NOT NULL DEFAULT 0,
                pm25 REAL NOT NULL DEFAULT 0,
                voc REAL NOT NULL DEFAULT 0,
                co REAL NOT NULL DEFAULT 0,
                no2 REAL NOT NULL DEFAULT 0,
                temperature REAL NOT NULL DEFAULT 0,
                humidity REAL NOT NULL DEFAULT 0,
                location TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_readings_device_time ON readings (device_id, epoch_ms);
            "#
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS readings;")
    }
}
