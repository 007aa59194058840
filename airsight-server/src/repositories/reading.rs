use airsight_api::models::Reading;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::errors::StorageError;
use crate::models::{ReadingRecord, ReadingRow};

/// Readings kept in SQLite.
#[derive(Clone)]
pub struct ReadingRepository {
    pool: SqlitePool,
}

impl ReadingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // Insert a reading, replacing any earlier one with the same id
    pub async fn save(&self, reading: &Reading) -> Result<String, StorageError> {
        let recorded_at = reading
            .timestamp
            .format(&Rfc3339)
            .map_err(|e| StorageError::Timestamp(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO readings
                (id, device_id, recorded_at, epoch_ms, aqi, co2, pm25, voc, co, no2, temperature, humidity, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&reading.id)
        .bind(&reading.device_id)
        .bind(recorded_at)
        .bind(reading.epoch_millis())
        .bind(reading.aqi)
        .bind(reading.co2)
        .bind(reading.pm25)
        .bind(reading.voc)
        .bind(reading.co)
        .bind(reading.no2)
        .bind(reading.temperature)
        .bind(reading.humidity)
        .bind(&reading.location)
        .execute(&self.pool)
        .await?;

        Ok(reading.id.clone())
    }

    // Most recent reading of a device
    pub async fn latest(&self, device_id: &str) -> Result<Option<ReadingRecord>, StorageError> {
        let row: Option<ReadingRow> = sqlx::query_as(
            r#"
            SELECT * FROM readings
            WHERE device_id = $1
            ORDER BY epoch_ms DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ReadingRecord::try_from).transpose()
    }

    // Readings of a device since the given instant, oldest first
    pub async fn range(&self, device_id: &str, since: OffsetDateTime) -> Result<Vec<ReadingRecord>, StorageError> {
        let since_ms = (since.unix_timestamp_nanos() / 1_000_000) as i64;

        let rows: Vec<ReadingRow> = sqlx::query_as(
            r#"
            SELECT * FROM readings
            WHERE device_id = $1 AND epoch_ms >= $2
            ORDER BY epoch_ms ASC, seq ASC
            "#,
        )
        .bind(device_id)
        .bind(since_ms)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReadingRecord::try_from).collect()
    }

    // Newest readings, optionally limited to one device
    pub async fn recent(&self, device_id: Option<&str>, limit: usize) -> Result<Vec<ReadingRecord>, StorageError> {
        let rows: Vec<ReadingRow> = match device_id {
            Some(device_id) => {
                sqlx::query_as(
                    r#"
                    SELECT * FROM readings
                    WHERE device_id = $1
                    ORDER BY epoch_ms DESC, seq DESC
                    LIMIT $2
                    "#,
                )
                .bind(device_id)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM readings ORDER BY epoch_ms DESC, seq DESC LIMIT $1")
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(ReadingRecord::try_from).collect()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
