use std::collections::HashMap;
use std::sync::Arc;

use airsight_api::models::Reading;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::errors::StorageError;
use crate::models::ReadingRecord;

#[derive(Default)]
struct MemoryState {
    closed: bool,
    next_seq: i64,
    records: HashMap<String, ReadingRecord>,
}

/// Readings kept in process memory, lost on restart.
#[derive(Clone, Default)]
pub struct MemoryReadingRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryReadingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn save(&self, reading: &Reading) -> Result<String, StorageError> {
        let mut state = self.state.write().await;
        if state.closed {
            return Err(StorageError::Closed);
        }

        state.next_seq += 1;
        let record = ReadingRecord {
            seq: state.next_seq,
            reading: reading.clone(),
        };
        state.records.insert(reading.id.clone(), record);

        Ok(reading.id.clone())
    }

    pub async fn latest(&self, device_id: &str) -> Result<Option<ReadingRecord>, StorageError> {
        let state = self.state.read().await;
        if state.closed {
            return Err(StorageError::Closed);
        }

        Ok(state
            .records
            .values()
            .filter(|record| record.reading.device_id == device_id)
            .max_by_key(|record| sort_key(record))
            .cloned())
    }

    pub async fn range(&self, device_id: &str, since: OffsetDateTime) -> Result<Vec<ReadingRecord>, StorageError> {
        let state = self.state.read().await;
        if state.closed {
            return Err(StorageError::Closed);
        }

        let mut records: Vec<ReadingRecord> = state
            .records
            .values()
            .filter(|record| record.reading.device_id == device_id && record.reading.timestamp >= since)
            .cloned()
            .collect();
        records.sort_by_key(sort_key);

        Ok(records)
    }

    pub async fn recent(&self, device_id: Option<&str>, limit: usize) -> Result<Vec<ReadingRecord>, StorageError> {
        let state = self.state.read().await;
        if state.closed {
            return Err(StorageError::Closed);
        }

        let mut records: Vec<ReadingRecord> = state
            .records
            .values()
            .filter(|record| device_id.is_none_or(|id| record.reading.device_id == id))
            .cloned()
            .collect();
        records.sort_by_key(|record| std::cmp::Reverse(sort_key(record)));
        records.truncate(limit);

        Ok(records)
    }

    pub async fn close(&self) {
        let mut state = self.state.write().await;
        state.closed = true;
        state.records.clear();
    }
}

fn sort_key(record: &ReadingRecord) -> (i64, i64) {
    (record.reading.epoch_millis(), record.seq)
}
