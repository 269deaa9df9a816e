//! Error types for the fairness engine
//!
//! Apart from lock contention in the persistent store, which is retried a
//! bounded number of times, every failure here is terminal. Storage faults
//! are kept apart from the protocol outcomes (`AlreadyUsed`, `NotFound`, ...)
//! so callers never confuse a lost `consume()` race with an infrastructure problem.

use thiserror::Error;

/// Root error type for all engine operations
#[derive(Debug, Error)]
pub enum FairnessError {
    /// Malformed or missing seed/bet data. Caller's fault.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown commitment identifier
    #[error("Commitment not found: {0}")]
    NotFound(String),

    /// Commitment has already been consumed by a completed round
    #[error("Commitment already used: {0}")]
    AlreadyUsed(String),

    /// Caller does not own the commitment
    #[error("Commitment {commitment_id} is not owned by {owner_id}")]
    OwnerMismatch { commitment_id: String, owner_id: String },

    #[error("Unknown game type: {0}")]
    UnknownGameType(String),

    /// Seed reveal requested before the round was played
    #[error("Commitment {0} has not been played yet")]
    NotRevealable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Storage system errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database open failed: {0}")]
    DatabaseOpenFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Corrupted data: {0}")]
    CorruptedData(String),

    /// Lock timeout or busy status that outlived the store's retries
    #[error("Storage contended: {0}")]
    Contended(String),
}

/// Configuration and validation errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Missing required field: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue { field: String, value: String, reason: String },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

// Convenience type alias for Results
pub type FairnessResult<T> = Result<T, FairnessError>;

impl FairnessError {
    /// True for failures caused by the storage layer rather than the protocol
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, FairnessError::Storage(_) | FairnessError::Configuration(_))
    }
}
