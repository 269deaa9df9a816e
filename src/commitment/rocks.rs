//! Persistent commitment store on a RocksDB `TransactionDB`
//!
//! Conditional updates run inside pessimistic transactions: `get_for_update`
//! takes the row lock, so two racing `mark_used` calls serialize on the key and
//! the loser reads `used == true`. A lock wait that times out is retried with
//! a fresh transaction.

use super::store::{CommitmentStore, ConsumeOutcome, RoundResolver};
use super::SeedPair;
use crate::errors::{FairnessError, FairnessResult, StorageError};
use rocksdb::{
    ErrorKind, Options, Transaction, TransactionDB, TransactionDBOptions, TransactionOptions, WriteOptions,
};
use std::path::Path;
use std::sync::Arc;

const SEED_PREFIX: &str = "seed:";
const ROUND_PREFIX: &str = "owner:round:";

/// Row lock wait per transaction, in milliseconds
const LOCK_TIMEOUT_MS: i64 = 1_000;
/// Transactions attempted before contention is reported
const LOCK_ATTEMPTS: u32 = 5;

fn seed_key(commitment_id: &str) -> Vec<u8> {
    format!("{}{}", SEED_PREFIX, commitment_id).into_bytes()
}

fn round_key(owner_id: &str) -> Vec<u8> {
    format!("{}{}", ROUND_PREFIX, owner_id).into_bytes()
}

fn decode_pair(commitment_id: &str, bytes: &[u8]) -> FairnessResult<SeedPair> {
    serde_json::from_slice(bytes).map_err(|e| {
        FairnessError::Storage(StorageError::CorruptedData(format!(
            "Failed to decode seed pair {}: {}",
            commitment_id, e
        )))
    })
}

fn encode_pair(pair: &SeedPair) -> FairnessResult<Vec<u8>> {
    serde_json::to_vec(pair).map_err(|e| {
        FairnessError::Storage(StorageError::WriteFailed(format!(
            "Failed to encode seed pair {}: {}",
            pair.commitment_id, e
        )))
    })
}

fn decode_round(owner_id: &str, bytes: &[u8]) -> FairnessResult<u64> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| {
        FairnessError::Storage(StorageError::CorruptedData(format!(
            "round counter for {} has {} bytes",
            owner_id,
            bytes.len()
        )))
    })?;
    Ok(u64::from_be_bytes(arr))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// Lock waits and busy statuses are contention; anything else is a hard fault
fn classify(kind: ErrorKind, message: String, access: Access) -> StorageError {
    match (kind, access) {
        (ErrorKind::Busy | ErrorKind::TimedOut | ErrorKind::TryAgain, _) => StorageError::Contended(message),
        (_, Access::Read) => StorageError::ReadFailed(message),
        (_, Access::Write) => StorageError::WriteFailed(message),
    }
}

fn read_err(e: rocksdb::Error) -> FairnessError {
    classify(e.kind(), e.into_string(), Access::Read).into()
}

fn write_err(e: rocksdb::Error) -> FairnessError {
    classify(e.kind(), e.into_string(), Access::Write).into()
}

#[derive(Clone)]
pub struct RocksCommitmentStore {
    db: Arc<TransactionDB>,
    sync_writes: bool,
}

impl RocksCommitmentStore {
    pub fn open<P: AsRef<Path>>(path: P, sync_writes: bool) -> FairnessResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let mut txn_db_opts = TransactionDBOptions::default();
        txn_db_opts.set_txn_lock_timeout(LOCK_TIMEOUT_MS);
        let db: TransactionDB = TransactionDB::open(&opts, &txn_db_opts, path.as_ref()).map_err(|e| {
            FairnessError::Storage(StorageError::DatabaseOpenFailed(format!(
                "{}: {}",
                path.as_ref().display(),
                e
            )))
        })?;

        tracing::debug!(path = %path.as_ref().display(), "Opened commitment store");

        Ok(Self {
            db: Arc::new(db),
            sync_writes,
        })
    }

    fn begin(&self) -> Transaction<'_, TransactionDB> {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        let mut txn_opts = TransactionOptions::default();
        txn_opts.set_lock_timeout(LOCK_TIMEOUT_MS);
        self.db.transaction_opt(&write_opts, &txn_opts)
    }

    /// Run `body` in a transaction and commit its result. An `Err` drops the
    /// transaction, which rolls it back; contention restarts from scratch.
    fn transact<T>(
        &self,
        body: impl Fn(&Transaction<'_, TransactionDB>) -> FairnessResult<T>,
    ) -> FairnessResult<T> {
        let mut attempt = 1;
        loop {
            let txn = self.begin();
            let result = body(&txn).and_then(|value| {
                txn.commit().map_err(write_err)?;
                Ok(value)
            });

            match result {
                Err(FairnessError::Storage(StorageError::Contended(reason))) if attempt < LOCK_ATTEMPTS => {
                    tracing::debug!(attempt, %reason, "Commitment store contended; retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

impl CommitmentStore for RocksCommitmentStore {
    fn insert(&self, pair: SeedPair) -> FairnessResult<SeedPair> {
        let key = seed_key(&pair.commitment_id);
        let counter_key = round_key(&pair.owner_id);

        self.transact(|txn| {
            let round_index = match txn.get_for_update(&counter_key, true).map_err(read_err)? {
                Some(bytes) => decode_round(&pair.owner_id, &bytes)?,
                None => 0,
            };
            if txn.get_for_update(&key, true).map_err(read_err)?.is_some() {
                return Err(StorageError::WriteFailed(format!(
                    "commitment {} already exists",
                    pair.commitment_id
                ))
                .into());
            }

            let mut stored = pair.clone();
            stored.round_index = round_index;
            txn.put(&key, encode_pair(&stored)?).map_err(write_err)?;
            txn.put(&counter_key, (round_index + 1).to_be_bytes()).map_err(write_err)?;
            Ok(stored)
        })
    }

    fn get(&self, commitment_id: &str) -> FairnessResult<Option<SeedPair>> {
        match self.db.get(seed_key(commitment_id)).map_err(read_err)? {
            Some(bytes) => decode_pair(commitment_id, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn mark_used(
        &self,
        commitment_id: &str,
        owner_id: &str,
        resolve: &RoundResolver<'_>,
    ) -> FairnessResult<ConsumeOutcome> {
        let key = seed_key(commitment_id);

        self.transact(|txn| {
            let Some(bytes) = txn.get_for_update(&key, true).map_err(read_err)? else {
                return Ok(ConsumeOutcome::NotFound);
            };

            let mut pair = decode_pair(commitment_id, &bytes)?;
            if pair.owner_id != owner_id {
                return Ok(ConsumeOutcome::OwnerMismatch);
            }
            if pair.used {
                return Ok(ConsumeOutcome::AlreadyUsed);
            }

            pair.round = resolve(&pair)?;
            pair.used = true;
            txn.put(&key, encode_pair(&pair)?).map_err(write_err)?;
            Ok(ConsumeOutcome::Consumed(pair))
        })
    }
}
