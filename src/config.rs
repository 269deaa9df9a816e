//! Configuration management for the fairspin engine
//!
//! TOML file, then environment overrides, then validation.

use crate::commitment::MIN_SEED_BYTES;
use crate::errors::{ConfigurationError, FairnessResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FairspinConfig {
    pub seeds: SeedConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub simulation: SimulationConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeedConfig {
    /// Random bytes per server seed
    pub seed_bytes: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            seed_bytes: MIN_SEED_BYTES,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Rocksdb,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "rocksdb" => Ok(StorageBackend::Rocksdb),
            _ => Err(ConfigurationError::InvalidValue {
                field: "storage.backend".to_string(),
                value: s.to_string(),
                reason: "expected 'memory' or 'rocksdb'".to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_directory: String,
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_directory: "./fairspin_data".to_string(),
            sync_writes: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "fairspin=info".to_string(),
            json: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Blocking workers allowed to resolve rounds at once
    pub concurrency: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Configuration loader with environment variable support
#[derive(Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> FairnessResult<FairspinConfig> {
        let mut config = match self.config_path {
            Some(ref path) => self.load_from_file(path)?,
            None => FairspinConfig::default(),
        };

        apply_overrides(&mut config, |key| env::var(key).ok())?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> FairnessResult<FairspinConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    pub fn validate(&self, config: &FairspinConfig) -> FairnessResult<()> {
        if config.seeds.seed_bytes < MIN_SEED_BYTES {
            return Err(ConfigurationError::InvalidValue {
                field: "seeds.seed_bytes".to_string(),
                value: config.seeds.seed_bytes.to_string(),
                reason: format!("Seeds need at least {} bytes", MIN_SEED_BYTES),
            }
            .into());
        }

        if config.storage.backend == StorageBackend::Rocksdb && config.storage.data_directory.is_empty() {
            return Err(ConfigurationError::MissingRequired("storage.data_directory".to_string()).into());
        }

        if config.simulation.concurrency == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "simulation.concurrency".to_string(),
                value: "0".to_string(),
                reason: "Concurrency cannot be zero".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &FairspinConfig, path: &str) -> FairnessResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

/// Apply `FAIRSPIN_*` overrides from `lookup`
fn apply_overrides<F>(config: &mut FairspinConfig, lookup: F) -> FairnessResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(bytes) = lookup("FAIRSPIN_SEED_BYTES") {
        config.seeds.seed_bytes = bytes.parse().map_err(|_| ConfigurationError::InvalidValue {
            field: "FAIRSPIN_SEED_BYTES".to_string(),
            value: bytes,
            reason: "Invalid byte count".to_string(),
        })?;
    }
    if let Some(backend) = lookup("FAIRSPIN_STORAGE_BACKEND") {
        config.storage.backend = backend.parse()?;
    }
    if let Some(data_dir) = lookup("FAIRSPIN_DATA_DIR") {
        config.storage.data_directory = data_dir;
    }
    if let Some(filter) = lookup("FAIRSPIN_LOG") {
        config.logging.filter = filter;
    }

    Ok(())
}
