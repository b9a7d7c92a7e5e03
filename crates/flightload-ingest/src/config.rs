//! Ingestion configuration
//!
//! Values come from `FLIGHTLOAD_*` environment variables and can be overridden
//! by command-line flags.

use flightload_common::{EntityKind, FlightloadError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default number of documents per batch
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default pause between batch submissions
pub const DEFAULT_BATCH_PAUSE_MS: u64 = 1000;

/// Default cap on concurrent writes in per-record mode
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;

/// How the Batch Writer submits documents. One mode per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Fixed-size batches with a pause between submissions
    #[default]
    Batched,
    /// One write per document, bounded by `max_in_flight`
    PerRecord,
}

impl std::str::FromStr for WriteMode {
    type Err = FlightloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "batched" | "batch" => Ok(WriteMode::Batched),
            "per_record" | "per-record" | "record" => Ok(WriteMode::PerRecord),
            _ => Err(FlightloadError::config(format!("Invalid write mode: {}", s))),
        }
    }
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Batched => write!(f, "batched"),
            WriteMode::PerRecord => write!(f, "per_record"),
        }
    }
}

/// Batch Writer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriterConfig {
    pub mode: WriteMode,
    /// Documents per batch (batched mode)
    pub batch_size: usize,
    /// Pause after each full batch, in milliseconds (batched mode)
    pub batch_pause_ms: u64,
    /// Concurrent writes allowed (per-record mode)
    pub max_in_flight: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            mode: WriteMode::Batched,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause_ms: DEFAULT_BATCH_PAUSE_MS,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl WriterConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    pub fn validate(&self) -> Result<(), FlightloadError> {
        if self.batch_size == 0 {
            return Err(FlightloadError::config("FLIGHTLOAD_BATCH_SIZE must be greater than 0"));
        }
        if self.max_in_flight == 0 {
            return Err(FlightloadError::config("FLIGHTLOAD_MAX_IN_FLIGHT must be greater than 0"));
        }
        Ok(())
    }
}

/// Document store connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            secret: None,
            timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Main ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestConfig {
    /// Directory holding the `.dat` files
    pub data_dir: PathBuf,
    /// Append-only failure log
    pub error_log: PathBuf,
    /// Show a progress spinner per entity
    pub show_progress: bool,
    pub writer: WriterConfig,
    pub store: StoreConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            error_log: PathBuf::from("errors.log"),
            show_progress: false,
            writer: WriterConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment variables
    ///
    /// - `FLIGHTLOAD_DATA_DIR`, `FLIGHTLOAD_ERROR_LOG`, `FLIGHTLOAD_PROGRESS`
    /// - `FLIGHTLOAD_WRITE_MODE` (batched, per_record)
    /// - `FLIGHTLOAD_BATCH_SIZE`, `FLIGHTLOAD_BATCH_PAUSE_MS`, `FLIGHTLOAD_MAX_IN_FLIGHT`
    /// - `FLIGHTLOAD_STORE_URL`, `FLIGHTLOAD_STORE_SECRET`, `FLIGHTLOAD_STORE_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, FlightloadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable numbers fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FlightloadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("FLIGHTLOAD_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(path) = lookup("FLIGHTLOAD_ERROR_LOG") {
            config.error_log = PathBuf::from(path);
        }

        config.show_progress = lookup("FLIGHTLOAD_PROGRESS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(false);

        if let Some(mode) = lookup("FLIGHTLOAD_WRITE_MODE") {
            config.writer.mode = mode.parse()?;
        }

        config.writer.batch_size = lookup("FLIGHTLOAD_BATCH_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_BATCH_SIZE);

        config.writer.batch_pause_ms = lookup("FLIGHTLOAD_BATCH_PAUSE_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_BATCH_PAUSE_MS);

        config.writer.max_in_flight = lookup("FLIGHTLOAD_MAX_IN_FLIGHT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_IN_FLIGHT);

        config.store.url = lookup("FLIGHTLOAD_STORE_URL");
        config.store.secret = lookup("FLIGHTLOAD_STORE_SECRET");
        config.store.timeout_secs = lookup("FLIGHTLOAD_STORE_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_STORE_TIMEOUT_SECS);

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), FlightloadError> {
        self.writer.validate()?;
        if self.store.timeout_secs == 0 {
            return Err(FlightloadError::config(
                "FLIGHTLOAD_STORE_TIMEOUT_SECS must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Input file for `kind` inside the data directory
    pub fn input_path(&self, kind: EntityKind) -> PathBuf {
        self.data_dir.join(kind.default_file_name())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = IngestConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.writer.mode, WriteMode::Batched);
        assert_eq!(config.writer.batch_size, 10);
        assert_eq!(config.writer.batch_pause(), Duration::from_secs(1));
        assert_eq!(config.error_log, PathBuf::from("errors.log"));
        assert!(config.store.url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = IngestConfig::from_lookup(lookup(&[
            ("FLIGHTLOAD_DATA_DIR", "/srv/openflights"),
            ("FLIGHTLOAD_WRITE_MODE", "per-record"),
            ("FLIGHTLOAD_MAX_IN_FLIGHT", "4"),
            ("FLIGHTLOAD_BATCH_SIZE", "not-a-number"),
            ("FLIGHTLOAD_STORE_URL", "https://store.internal"),
        ]))
        .unwrap();

        assert_eq!(config.writer.mode, WriteMode::PerRecord);
        assert_eq!(config.writer.max_in_flight, 4);
        assert_eq!(config.writer.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.store.url.as_deref(), Some("https://store.internal"));
        assert_eq!(
            config.input_path(EntityKind::Route),
            PathBuf::from("/srv/openflights/routes.dat")
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(IngestConfig::from_lookup(lookup(&[("FLIGHTLOAD_WRITE_MODE", "fanout")])).is_err());
        assert!(IngestConfig::from_lookup(lookup(&[("FLIGHTLOAD_BATCH_SIZE", "0")])).is_err());
        assert!(IngestConfig::from_lookup(lookup(&[("FLIGHTLOAD_MAX_IN_FLIGHT", "0")])).is_err());
    }
}
