use std::env;
use std::path::Path;

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};

use crate::configs::normalize_path;

const DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../configs/default.toml"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub backend: Backend,
    pub url: String,
    pub clean_start: bool,
    pub migration_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directory {
    pub sample_size: usize,
    pub staleness_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensors {
    pub history_hours: i64,
    pub recent_limit: usize,
    pub demo_device: Option<String>,
    pub realtime_device: String,
    pub stream_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub database: Database,
    pub directory: Directory,
    pub sensors: Sensors,
}

impl Settings {
    /// Loads the bundled defaults, then `configs/default`, `configs/<RUN_MODE>`
    /// and `AIRSIGHT__SECTION__KEY` variables, later sources winning.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let mut settings: Settings = Self::builder()
            .add_source(File::with_name("configs/default").required(false))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("AIRSIGHT").prefix_separator("__").separator("__"))
            .build()?
            .try_deserialize()?;

        if let Some(migrate) = &settings.database.migration_path {
            if Path::new(migrate).is_dir() {
                let migrate_path = normalize_path(migrate)
                    .map_err(|e| ConfigError::Message(e.to_string()))?
                    .to_string_lossy()
                    .to_string();

                settings.database.migration_path = Some(migrate_path);
            } else {
                settings.database.migration_path = None;
            }
        }

        Ok(settings)
    }

    /// The bundled defaults alone, without consulting the filesystem or environment.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder().build()?.try_deserialize()
    }

    fn builder() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }
}
