//! Seed commitment manager
//!
//! Issues server seeds, publishes only their SHA-256 commitment, and hands the
//! secret out exactly once per commitment. The manager owns every state
//! transition of a `SeedPair`; storage is delegated to a `CommitmentStore`.

pub mod rocks;
pub mod store;

pub use rocks::RocksCommitmentStore;
pub use store::{CommitmentStore, ConsumeOutcome, InMemoryCommitmentStore, RoundResolver};

use crate::errors::{FairnessError, FairnessResult, StorageError};
use crate::games::{GameOutcome, GameType};
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Shortest server seed the manager will issue, in random bytes
pub const MIN_SEED_BYTES: usize = 32;

/// Lowercase hex SHA-256 of the seed text
pub fn hash_server_seed(server_seed: &str) -> String {
    hex::encode(Sha256::digest(server_seed.as_bytes()))
}

/// Byte-for-byte check of a revealed seed against its published hash.
/// Malformed hashes never verify.
pub fn commitment_matches(server_seed: &str, server_seed_hash: &str) -> bool {
    let Ok(expected) = hex::decode(server_seed_hash.trim()) else {
        return false;
    };
    let actual = Sha256::digest(server_seed.as_bytes());
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

/// One commitment unit
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPair {
    pub commitment_id: String,
    pub owner_id: String,
    /// Hex text of the random seed bytes; this text is the seed material
    pub server_seed: String,
    pub server_seed_hash: String,
    pub round_index: u64,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    /// Set in the same update that marks the pair used
    #[serde(default)]
    pub round: Option<RoundRecord>,
}

/// The round a consumed seed resolved, kept so anyone can replay it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub game_type: GameType,
    pub client_seed: String,
    pub bet_amount: u64,
    pub outcome: GameOutcome,
    pub played_at: DateTime<Utc>,
}

impl SeedPair {
    /// Fresh Issued pair with `seed_bytes` of OS randomness
    pub fn issue(owner_id: &str, round_index: u64, seed_bytes: usize) -> Self {
        let mut raw = vec![0u8; seed_bytes.max(MIN_SEED_BYTES)];
        OsRng.fill_bytes(&mut raw);
        let server_seed = hex::encode(raw);

        Self {
            commitment_id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            server_seed_hash: hash_server_seed(&server_seed),
            server_seed,
            round_index,
            used: false,
            created_at: Utc::now(),
            round: None,
        }
    }
}

impl fmt::Debug for SeedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedPair")
            .field("commitment_id", &self.commitment_id)
            .field("owner_id", &self.owner_id)
            .field("server_seed", &"<redacted>")
            .field("server_seed_hash", &self.server_seed_hash)
            .field("round_index", &self.round_index)
            .field("used", &self.used)
            .field("created_at", &self.created_at)
            .field("round", &self.round)
            .finish()
    }
}

/// What `commit` publishes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commitment {
    pub commitment_id: String,
    pub server_seed_hash: String,
    pub round_index: u64,
}

/// What `consume` hands to the resolver
#[derive(Clone)]
pub struct ConsumedSeed {
    pub server_seed: String,
    pub server_seed_hash: String,
    pub round_index: u64,
}

impl From<SeedPair> for ConsumedSeed {
    fn from(pair: SeedPair) -> Self {
        Self {
            server_seed: pair.server_seed,
            server_seed_hash: pair.server_seed_hash,
            round_index: pair.round_index,
        }
    }
}

/// Public view of a commitment; the seed and the round appear only once it is used
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicCommitment {
    pub commitment_id: String,
    pub owner_id: String,
    pub server_seed_hash: String,
    pub round_index: u64,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_seed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundRecord>,
}

impl From<SeedPair> for PublicCommitment {
    fn from(pair: SeedPair) -> Self {
        let server_seed = pair.used.then_some(pair.server_seed);
        let round = pair.round.filter(|_| pair.used);
        Self {
            commitment_id: pair.commitment_id,
            owner_id: pair.owner_id,
            server_seed_hash: pair.server_seed_hash,
            round_index: pair.round_index,
            used: pair.used,
            created_at: pair.created_at,
            server_seed,
            round,
        }
    }
}

fn unplayed(_: &SeedPair) -> FairnessResult<Option<RoundRecord>> {
    Ok(None)
}

#[derive(Clone)]
pub struct CommitmentManager {
    store: Arc<dyn CommitmentStore>,
    seed_bytes: usize,
}

impl CommitmentManager {
    pub fn new(store: Arc<dyn CommitmentStore>, seed_bytes: usize) -> Self {
        Self {
            store,
            seed_bytes: seed_bytes.max(MIN_SEED_BYTES),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCommitmentStore::new()), MIN_SEED_BYTES)
    }

    /// Issue a new seed for `owner_id` and publish its hash
    pub fn commit(&self, owner_id: &str) -> FairnessResult<Commitment> {
        if owner_id.trim().is_empty() {
            return Err(FairnessError::InvalidInput("owner_id must not be empty".to_string()));
        }

        let pair = self.store.insert(SeedPair::issue(owner_id, 0, self.seed_bytes))?;

        tracing::info!(
            commitment_id = %pair.commitment_id,
            owner_id,
            round_index = pair.round_index,
            server_seed_hash = %pair.server_seed_hash,
            "Issued seed commitment"
        );

        Ok(Commitment {
            commitment_id: pair.commitment_id,
            server_seed_hash: pair.server_seed_hash,
            round_index: pair.round_index,
        })
    }

    /// Atomically mark the commitment Consumed and return its secret seed
    pub fn consume(&self, commitment_id: &str, owner_id: &str) -> FairnessResult<ConsumedSeed> {
        self.transition(commitment_id, owner_id, &unplayed)
            .map(ConsumedSeed::from)
    }

    /// Consume the commitment and resolve `game` with its seed in the same
    /// store update. If the game fails the commitment stays Issued.
    pub fn play(
        &self,
        commitment_id: &str,
        owner_id: &str,
        game: GameType,
        client_seed: &str,
        bet_amount: u64,
    ) -> FairnessResult<(ConsumedSeed, RoundRecord)> {
        let resolve = |pair: &SeedPair| -> FairnessResult<Option<RoundRecord>> {
            let outcome = game.play(bet_amount, client_seed, &pair.server_seed, pair.round_index)?;
            Ok(Some(RoundRecord {
                game_type: game,
                client_seed: client_seed.to_string(),
                bet_amount,
                outcome,
                played_at: Utc::now(),
            }))
        };

        let mut pair = self.transition(commitment_id, owner_id, &resolve)?;
        let round = pair.round.take().ok_or_else(|| {
            StorageError::CorruptedData(format!("commitment {} stored without its round", commitment_id))
        })?;
        Ok((ConsumedSeed::from(pair), round))
    }

    fn transition(
        &self,
        commitment_id: &str,
        owner_id: &str,
        resolve: &RoundResolver<'_>,
    ) -> FairnessResult<SeedPair> {
        match self.store.mark_used(commitment_id, owner_id, resolve)? {
            ConsumeOutcome::Consumed(pair) => {
                tracing::debug!(commitment_id, owner_id, "Commitment consumed");
                Ok(pair)
            }
            ConsumeOutcome::AlreadyUsed => {
                tracing::info!(commitment_id, owner_id, "Replay against consumed commitment");
                Err(FairnessError::AlreadyUsed(commitment_id.to_string()))
            }
            ConsumeOutcome::NotFound => Err(FairnessError::NotFound(commitment_id.to_string())),
            ConsumeOutcome::OwnerMismatch => {
                tracing::warn!(
                    commitment_id,
                    owner_id,
                    "Commitment requested by non-owner; possible abuse"
                );
                Err(FairnessError::OwnerMismatch {
                    commitment_id: commitment_id.to_string(),
                    owner_id: owner_id.to_string(),
                })
            }
        }
    }

    /// Release the seed for public verification once the round is played
    pub fn reveal(&self, commitment_id: &str) -> FairnessResult<String> {
        let pair = self
            .store
            .get(commitment_id)?
            .ok_or_else(|| FairnessError::NotFound(commitment_id.to_string()))?;

        if !pair.used {
            return Err(FairnessError::NotRevealable(commitment_id.to_string()));
        }
        Ok(pair.server_seed)
    }

    pub fn lookup(&self, commitment_id: &str) -> FairnessResult<PublicCommitment> {
        self.store
            .get(commitment_id)?
            .map(PublicCommitment::from)
            .ok_or_else(|| FairnessError::NotFound(commitment_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::Multiplier;

    #[test]
    fn test_issued_pair_satisfies_commitment() {
        let pair = SeedPair::issue("alice", 0, 32);
        assert_eq!(pair.server_seed.len(), 64);
        assert_eq!(pair.server_seed_hash.len(), 64);
        assert!(commitment_matches(&pair.server_seed, &pair.server_seed_hash));
        assert!(!pair.used);
    }

    #[test]
    fn test_commitment_rejects_tampering() {
        let pair = SeedPair::issue("alice", 0, 32);
        let mut tampered = pair.server_seed.clone().into_bytes();
        tampered[0] ^= 0x01;
        let tampered = String::from_utf8(tampered).unwrap();

        assert!(!commitment_matches(&tampered, &pair.server_seed_hash));
        assert!(!commitment_matches(&pair.server_seed, "not-hex"));
        assert!(!commitment_matches(&pair.server_seed, &pair.server_seed_hash[..62]));
    }

    #[test]
    fn test_known_hash() {
        assert_eq!(
            hash_server_seed("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_debug_redacts_seed() {
        let pair = SeedPair::issue("alice", 0, 32);
        let rendered = format!("{:?}", pair);
        assert!(!rendered.contains(&pair.server_seed));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_commit_consume_reveal() {
        let manager = CommitmentManager::in_memory();
        let commitment = manager.commit("alice").unwrap();

        assert!(matches!(
            manager.reveal(&commitment.commitment_id),
            Err(FairnessError::NotRevealable(_))
        ));
        assert!(manager.lookup(&commitment.commitment_id).unwrap().server_seed.is_none());

        let seed = manager.consume(&commitment.commitment_id, "alice").unwrap();
        assert_eq!(hash_server_seed(&seed.server_seed), commitment.server_seed_hash);
        assert_eq!(seed.round_index, commitment.round_index);

        let revealed = manager.reveal(&commitment.commitment_id).unwrap();
        assert_eq!(revealed, seed.server_seed);
        assert_eq!(
            manager.lookup(&commitment.commitment_id).unwrap().server_seed,
            Some(revealed)
        );
    }

    #[test]
    fn test_consume_errors() {
        let manager = CommitmentManager::in_memory();
        let commitment = manager.commit("alice").unwrap();

        assert!(matches!(
            manager.consume("unknown", "alice"),
            Err(FairnessError::NotFound(_))
        ));
        assert!(matches!(
            manager.consume(&commitment.commitment_id, "bob"),
            Err(FairnessError::OwnerMismatch { .. })
        ));
        manager.consume(&commitment.commitment_id, "alice").unwrap();
        assert!(matches!(
            manager.consume(&commitment.commitment_id, "alice"),
            Err(FairnessError::AlreadyUsed(_))
        ));
    }

    #[test]
    fn test_round_index_increases_per_owner() {
        let manager = CommitmentManager::in_memory();
        let first = manager.commit("alice").unwrap();
        let second = manager.commit("alice").unwrap();
        let other = manager.commit("bob").unwrap();

        assert_eq!(first.round_index, 0);
        assert_eq!(second.round_index, 1);
        assert_eq!(other.round_index, 0);
        assert_ne!(first.server_seed_hash, second.server_seed_hash);
    }

    #[test]
    fn test_play_records_round_with_consumption() {
        let manager = CommitmentManager::in_memory();
        let commitment = manager.commit("alice").unwrap();

        let (seed, round) = manager
            .play(&commitment.commitment_id, "alice", GameType::Roulette, "lucky", 20)
            .unwrap();
        assert_eq!(round.game_type, GameType::Roulette);
        assert_eq!(round.client_seed, "lucky");
        assert_eq!(
            round.outcome,
            GameType::Roulette.play(20, "lucky", &seed.server_seed, seed.round_index).unwrap()
        );

        let public = manager.lookup(&commitment.commitment_id).unwrap();
        assert!(public.used);
        assert_eq!(public.round, Some(round));
        assert!(matches!(
            manager.play(&commitment.commitment_id, "alice", GameType::Roulette, "lucky", 20),
            Err(FairnessError::AlreadyUsed(_))
        ));
    }

    #[test]
    fn test_failed_play_keeps_commitment_issued() {
        let manager = CommitmentManager::in_memory();

        // Any blackjack win overflows the payout at this bet.
        let mut rejected = 0;
        for _ in 0..64 {
            let commitment = manager.commit("alice").unwrap();
            match manager.play(&commitment.commitment_id, "alice", GameType::Blackjack, "c", u64::MAX) {
                Err(FairnessError::InvalidInput(_)) => {
                    let public = manager.lookup(&commitment.commitment_id).unwrap();
                    assert!(!public.used);
                    assert!(public.round.is_none());
                    assert!(manager.consume(&commitment.commitment_id, "alice").is_ok());
                    rejected += 1;
                }
                Ok((_, round)) => assert!(round.outcome.payout_multiplier <= Multiplier::whole(1)),
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert!(rejected > 0);
    }

    #[test]
    fn test_commit_rejects_empty_owner() {
        let manager = CommitmentManager::in_memory();
        assert!(matches!(manager.commit("  "), Err(FairnessError::InvalidInput(_))));
    }
}
