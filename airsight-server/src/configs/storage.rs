use std::path::Path;
use std::str::FromStr;

use airsight_api::models::Reading;
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use time::OffsetDateTime;

use crate::configs::schema::SchemaManager;
use crate::configs::settings::{Backend, Database};
use crate::errors::StorageError;
use crate::models::ReadingRecord;
use crate::repositories::{MemoryReadingRepository, ReadingRepository};

/// Reading store selected by `database.backend`.
#[derive(Clone)]
pub enum Storage {
    Sqlite(ReadingRepository),
    Memory(MemoryReadingRepository),
}

impl Storage {
    pub async fn connect(database: &Database, schema_manager: SchemaManager) -> Result<Self, StorageError> {
        match database.backend {
            Backend::Memory => {
                tracing::info!("using the in-memory reading store");
                Ok(Storage::Memory(MemoryReadingRepository::new()))
            }
            Backend::Sqlite => {
                // every connection to `:memory:` opens a separate database
                let max_connections = if database.url.contains(":memory:") { 1 } else { 10 };
                let options = SqliteConnectOptions::from_str(&database.url)?.create_if_missing(true);

                let pool = SqlitePoolOptions::new()
                    .min_connections(1) // in memory db might drop connection when 0
                    .max_connections(max_connections)
                    .connect_with(options)
                    .await?;

                Self::create_schema(&pool, &schema_manager, database).await?;
                tracing::info!("connected to sqlite at {}", database.url);

                Ok(Storage::Sqlite(ReadingRepository::new(pool)))
            }
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Storage::Sqlite(_) => Backend::Sqlite,
            Storage::Memory(_) => Backend::Memory,
        }
    }

    /// Stores `reading` under its id, overwriting a previous reading with the same id.
    pub async fn save(&self, reading: &Reading) -> Result<String, StorageError> {
        match self {
            Storage::Sqlite(repository) => repository.save(reading).await,
            Storage::Memory(repository) => repository.save(reading).await,
        }
    }

    pub async fn latest(&self, device_id: &str) -> Result<Option<ReadingRecord>, StorageError> {
        match self {
            Storage::Sqlite(repository) => repository.latest(device_id).await,
            Storage::Memory(repository) => repository.latest(device_id).await,
        }
    }

    /// Readings of `device_id` taken at or after `since`, oldest first.
    pub async fn range(&self, device_id: &str, since: OffsetDateTime) -> Result<Vec<ReadingRecord>, StorageError> {
        match self {
            Storage::Sqlite(repository) => repository.range(device_id, since).await,
            Storage::Memory(repository) => repository.range(device_id, since).await,
        }
    }

    /// Up to `limit` newest readings, across all devices unless `device_id` is given.
    pub async fn recent(&self, device_id: Option<&str>, limit: usize) -> Result<Vec<ReadingRecord>, StorageError> {
        match self {
            Storage::Sqlite(repository) => repository.recent(device_id, limit).await,
            Storage::Memory(repository) => repository.recent(device_id, limit).await,
        }
    }

    pub async fn close(&self) {
        match self {
            Storage::Sqlite(repository) => repository.close().await,
            Storage::Memory(repository) => repository.close().await,
        }
        tracing::info!("reading store closed");
    }

    async fn create_schema(pool: &SqlitePool, schema: &SchemaManager, database: &Database) -> Result<(), StorageError> {
        if database.clean_start {
            let statements = schema.dispose_schema();

            // Clean migration history
            sqlx::query("DROP TABLE IF EXISTS _sqlx_migrations")
                .execute(pool)
                .await?;

            sqlx::query(&statements.join("\n"))
                .execute(pool)
                .await?;

            tracing::warn!("perform a clean boot: dropped {:?}", schema.table_names());
        }

        sqlx::query(&schema.create_schema().join("\n"))
            .execute(pool)
            .await?;

        if let Some(migration_path) = database.migration_path.clone() {
            let mut pool_connection = pool.acquire().await?;
            let migrator = Migrator::new(Path::new(&migration_path)).await?;
            migrator.run(&mut pool_connection).await?;

            tracing::info!("database migration success");
        }

        Ok(())
    }
}
