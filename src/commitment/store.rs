//! Commitment storage contract and the in-memory implementation
//!
//! The store is the only shared mutable state in the engine. Its contract
//! carries the single-use invariant: `mark_used` is one conditional update,
//! never a read followed by a separate write.

use super::{RoundRecord, SeedPair};
use crate::errors::{FairnessResult, StorageError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Resolves the round while the record is held. `None` consumes without a result.
pub type RoundResolver<'a> = dyn Fn(&SeedPair) -> FairnessResult<Option<RoundRecord>> + 'a;

/// Result of an atomic Issued -> Consumed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// This caller won the transition; the record as it now stands
    Consumed(SeedPair),
    AlreadyUsed,
    NotFound,
    OwnerMismatch,
}

pub trait CommitmentStore: Send + Sync {
    /// Persist a freshly issued pair under the owner's next round index.
    /// The counter only advances when the pair is stored; identifiers are
    /// never overwritten. Returns the pair as stored.
    fn insert(&self, pair: SeedPair) -> FairnessResult<SeedPair>;

    fn get(&self, commitment_id: &str) -> FairnessResult<Option<SeedPair>>;

    /// Test-and-set on the `used` flag, guarded by the owner check.
    /// `resolve` runs inside the update and its record is stored with the
    /// transition; when it fails the commitment stays Issued.
    fn mark_used(
        &self,
        commitment_id: &str,
        owner_id: &str,
        resolve: &RoundResolver<'_>,
    ) -> FairnessResult<ConsumeOutcome>;
}

/// Arena keyed by commitment id. Shard locks make each update atomic.
#[derive(Default)]
pub struct InMemoryCommitmentStore {
    seeds: DashMap<String, SeedPair>,
    rounds: DashMap<String, u64>,
}

impl InMemoryCommitmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

impl CommitmentStore for InMemoryCommitmentStore {
    fn insert(&self, mut pair: SeedPair) -> FairnessResult<SeedPair> {
        // Lock order is always rounds then seeds; mark_used only takes seeds.
        let mut counter = self.rounds.entry(pair.owner_id.clone()).or_insert(0);

        match self.seeds.entry(pair.commitment_id.clone()) {
            Entry::Occupied(_) => Err(StorageError::WriteFailed(format!(
                "commitment {} already exists",
                pair.commitment_id
            ))
            .into()),
            Entry::Vacant(slot) => {
                pair.round_index = *counter;
                slot.insert(pair.clone());
                *counter += 1;
                Ok(pair)
            }
        }
    }

    fn get(&self, commitment_id: &str) -> FairnessResult<Option<SeedPair>> {
        Ok(self.seeds.get(commitment_id).map(|entry| entry.value().clone()))
    }

    fn mark_used(
        &self,
        commitment_id: &str,
        owner_id: &str,
        resolve: &RoundResolver<'_>,
    ) -> FairnessResult<ConsumeOutcome> {
        // The shard write lock is held for the whole test-and-set.
        let Some(mut entry) = self.seeds.get_mut(commitment_id) else {
            return Ok(ConsumeOutcome::NotFound);
        };

        let pair = entry.value_mut();
        if pair.owner_id != owner_id {
            return Ok(ConsumeOutcome::OwnerMismatch);
        }
        if pair.used {
            return Ok(ConsumeOutcome::AlreadyUsed);
        }

        let round = resolve(pair)?;
        pair.used = true;
        pair.round = round;
        Ok(ConsumeOutcome::Consumed(pair.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FairnessError;

    fn unplayed(_: &SeedPair) -> FairnessResult<Option<RoundRecord>> {
        Ok(None)
    }

    #[test]
    fn test_mark_used_transitions_once() {
        let store = InMemoryCommitmentStore::new();
        let pair = store.insert(SeedPair::issue("alice", 0, 32)).unwrap();

        match store.mark_used(&pair.commitment_id, "alice", &unplayed).unwrap() {
            ConsumeOutcome::Consumed(consumed) => {
                assert!(consumed.used);
                assert_eq!(consumed.server_seed, pair.server_seed);
            }
            other => panic!("expected consumption, got {:?}", other),
        }
        assert_eq!(
            store.mark_used(&pair.commitment_id, "alice", &unplayed).unwrap(),
            ConsumeOutcome::AlreadyUsed
        );
    }

    #[test]
    fn test_mark_used_checks_owner_first() {
        let store = InMemoryCommitmentStore::new();
        let pair = store.insert(SeedPair::issue("alice", 0, 32)).unwrap();

        assert_eq!(
            store.mark_used(&pair.commitment_id, "mallory", &unplayed).unwrap(),
            ConsumeOutcome::OwnerMismatch
        );
        // A foreign caller cannot burn the commitment.
        assert!(!store.get(&pair.commitment_id).unwrap().unwrap().used);
        assert_eq!(
            store.mark_used("missing", "alice", &unplayed).unwrap(),
            ConsumeOutcome::NotFound
        );
    }

    #[test]
    fn test_failed_resolution_leaves_commitment_issued() {
        let store = InMemoryCommitmentStore::new();
        let pair = store.insert(SeedPair::issue("alice", 0, 32)).unwrap();

        let failing = |_: &SeedPair| -> FairnessResult<Option<RoundRecord>> {
            Err(FairnessError::InvalidInput("payout overflow".to_string()))
        };
        assert!(store.mark_used(&pair.commitment_id, "alice", &failing).is_err());
        assert!(!store.get(&pair.commitment_id).unwrap().unwrap().used);
        assert!(matches!(
            store.mark_used(&pair.commitment_id, "alice", &unplayed).unwrap(),
            ConsumeOutcome::Consumed(_)
        ));
    }

    #[test]
    fn test_duplicate_insert_rejected_without_advancing_round() {
        let store = InMemoryCommitmentStore::new();
        let pair = store.insert(SeedPair::issue("alice", 0, 32)).unwrap();
        assert_eq!(pair.round_index, 0);

        assert!(store.insert(pair.clone()).is_err());
        assert_eq!(store.len(), 1);

        let next = store.insert(SeedPair::issue("alice", 0, 32)).unwrap();
        assert_eq!(next.round_index, 1);
    }

    #[test]
    fn test_round_counters_are_per_owner() {
        let store = InMemoryCommitmentStore::new();
        let round = |owner: &str| store.insert(SeedPair::issue(owner, 0, 32)).unwrap().round_index;

        assert_eq!(round("alice"), 0);
        assert_eq!(round("alice"), 1);
        assert_eq!(round("bob"), 0);
        assert_eq!(round("alice"), 2);
    }
}
