//! Service construction from configuration
//!
//! Centralizes the store selection the binary and tests would otherwise repeat.

use crate::commitment::{CommitmentManager, CommitmentStore, InMemoryCommitmentStore, RocksCommitmentStore};
use crate::config::{FairspinConfig, StorageBackend};
use crate::errors::{FairnessResult, StorageError};
use crate::service::FairnessService;
use std::sync::Arc;

pub struct ServiceFactory;

impl ServiceFactory {
    /// Open the configured commitment store
    pub fn open_store(config: &FairspinConfig) -> FairnessResult<Arc<dyn CommitmentStore>> {
        let store: Arc<dyn CommitmentStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(InMemoryCommitmentStore::new()),
            StorageBackend::Rocksdb => {
                std::fs::create_dir_all(&config.storage.data_directory).map_err(|e| {
                    StorageError::DatabaseOpenFailed(format!(
                        "{}: {}",
                        config.storage.data_directory, e
                    ))
                })?;
                Arc::new(RocksCommitmentStore::open(
                    &config.storage.data_directory,
                    config.storage.sync_writes,
                )?)
            }
        };

        tracing::debug!(backend = ?config.storage.backend, "Commitment store ready");
        Ok(store)
    }

    pub fn create_service(config: &FairspinConfig) -> FairnessResult<FairnessService> {
        let store = Self::open_store(config)?;
        let manager = CommitmentManager::new(store, config.seeds.seed_bytes);
        Ok(FairnessService::new(manager))
    }
}
