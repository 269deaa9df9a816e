//! Fairness service: the Commit / Play / Reveal / Verify boundary
//!
//! Wires the commitment manager, the resolvers and the verifier together and
//! hands final outcomes to a ledger. Transport is left to the caller.

pub mod models;

pub use models::*;

use crate::commitment::{CommitmentManager, PublicCommitment};
use crate::errors::{FairnessError, FairnessResult};
use crate::games::{available_games, GameInfo, GameType};
use crate::metrics::EngineMetrics;
use crate::verifier;
use std::sync::Arc;

/// Receives every finalized round. Balances live behind this trait.
pub trait LedgerSink: Send + Sync {
    fn settle(&self, settlement: &Settlement);
}

/// Default sink: records the settlement in the log and nothing else
#[derive(Debug, Default)]
pub struct TracingLedger;

impl LedgerSink for TracingLedger {
    fn settle(&self, settlement: &Settlement) {
        tracing::info!(
            owner_id = %settlement.owner_id,
            commitment_id = %settlement.commitment_id,
            game_type = %settlement.game_type,
            bet_amount = settlement.bet_amount,
            payout_amount = settlement.payout_amount,
            "Round settled"
        );
    }
}

#[derive(Clone)]
pub struct FairnessService {
    manager: CommitmentManager,
    ledger: Arc<dyn LedgerSink>,
    metrics: Arc<EngineMetrics>,
}

impl FairnessService {
    pub fn new(manager: CommitmentManager) -> Self {
        Self::with_ledger(manager, Arc::new(TracingLedger))
    }

    pub fn with_ledger(manager: CommitmentManager, ledger: Arc<dyn LedgerSink>) -> Self {
        Self {
            manager,
            ledger,
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(CommitmentManager::in_memory())
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn commit(&self, request: &CommitRequest) -> FairnessResult<CommitResponse> {
        let commitment = self.manager.commit(&request.owner_id)?;
        self.metrics.record_commitment();

        Ok(CommitResponse {
            commitment_id: commitment.commitment_id,
            server_seed_hash: commitment.server_seed_hash,
            round_index: commitment.round_index,
        })
    }

    /// Resolve one round against a previously issued commitment
    pub fn play(&self, request: &PlayRequest) -> FairnessResult<PlayResponse> {
        // Everything that can be rejected is rejected before the seed is burned.
        let game: GameType = request.game_type.parse()?;
        validate_bet(game, request.bet_amount)?;
        if request.client_seed.is_empty() {
            return Err(FairnessError::InvalidInput("client_seed must not be empty".to_string()));
        }

        let (seed, round) = self
            .manager
            .play(
                &request.commitment_id,
                &request.owner_id,
                game,
                &request.client_seed,
                request.bet_amount,
            )
            .inspect_err(|e| self.record_consume_failure(e))?;
        let outcome = round.outcome;

        tracing::info!(
            commitment_id = %request.commitment_id,
            owner_id = %request.owner_id,
            game_type = %game,
            round_index = seed.round_index,
            multiplier = %outcome.payout_multiplier,
            payout_amount = outcome.payout_amount,
            "Round resolved"
        );

        self.metrics.record_round(request.bet_amount, outcome.payout_amount);
        self.ledger.settle(&Settlement {
            owner_id: request.owner_id.clone(),
            commitment_id: request.commitment_id.clone(),
            game_type: game,
            bet_amount: request.bet_amount,
            payout_amount: outcome.payout_amount,
        });

        Ok(PlayResponse {
            outcome,
            round_index: seed.round_index,
            server_seed_hash: seed.server_seed_hash,
        })
    }

    pub fn reveal(&self, request: &RevealRequest) -> FairnessResult<RevealResponse> {
        let server_seed = self.manager.reveal(&request.commitment_id)?;
        Ok(RevealResponse { server_seed })
    }

    pub fn verify(&self, request: &VerifyRequest) -> VerifyResponse {
        let verified = verifier::verify(
            &request.game_type,
            &request.client_seed,
            &request.server_seed,
            &request.server_seed_hash,
            request.round_index,
            &request.claimed_outcome,
        );
        self.metrics.record_verification(verified);

        VerifyResponse { verified }
    }

    pub fn lookup(&self, commitment_id: &str) -> FairnessResult<PublicCommitment> {
        self.manager.lookup(commitment_id)
    }

    pub fn games(&self) -> Vec<GameInfo> {
        available_games()
    }

    fn record_consume_failure(&self, err: &FairnessError) {
        match err {
            FairnessError::AlreadyUsed(_) => self.metrics.record_conflict(),
            FairnessError::OwnerMismatch { .. } => self.metrics.record_owner_mismatch(),
            _ => {}
        }
    }
}

fn validate_bet(game: GameType, bet_amount: u64) -> FairnessResult<()> {
    let (min_bet, max_bet) = game.bet_limits();
    if bet_amount < min_bet || bet_amount > max_bet {
        return Err(FairnessError::InvalidInput(format!(
            "bet {} outside {} limits [{}, {}]",
            bet_amount, game, min_bet, max_bet
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLedger {
        settled: Mutex<Vec<Settlement>>,
    }

    impl LedgerSink for RecordingLedger {
        fn settle(&self, settlement: &Settlement) {
            self.settled.lock().unwrap().push(settlement.clone());
        }
    }

    fn play_request(commitment_id: &str, game_type: &str, bet_amount: u64) -> PlayRequest {
        PlayRequest {
            commitment_id: commitment_id.to_string(),
            owner_id: "alice".to_string(),
            game_type: game_type.to_string(),
            client_seed: "client-seed".to_string(),
            bet_amount,
        }
    }

    #[test]
    fn test_full_round_settles_once() {
        let ledger = Arc::new(RecordingLedger::default());
        let service = FairnessService::with_ledger(CommitmentManager::in_memory(), ledger.clone());

        let commit = service.commit(&CommitRequest { owner_id: "alice".into() }).unwrap();
        let played = service.play(&play_request(&commit.commitment_id, "slots", 10)).unwrap();
        assert_eq!(played.server_seed_hash, commit.server_seed_hash);
        assert_eq!(played.round_index, commit.round_index);

        let settled = ledger.settled.lock().unwrap();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].payout_amount, played.outcome.payout_amount);
        assert_eq!(settled[0].game_type, GameType::Slots);
    }

    #[test]
    fn test_rejected_request_does_not_burn_commitment() {
        let service = FairnessService::in_memory();
        let commit = service.commit(&CommitRequest { owner_id: "alice".into() }).unwrap();

        assert!(matches!(
            service.play(&play_request(&commit.commitment_id, "slots", 1_000_000)),
            Err(FairnessError::InvalidInput(_))
        ));
        assert!(matches!(
            service.play(&play_request(&commit.commitment_id, "craps", 10)),
            Err(FairnessError::UnknownGameType(_))
        ));
        let mut empty_seed = play_request(&commit.commitment_id, "slots", 10);
        empty_seed.client_seed.clear();
        assert!(matches!(service.play(&empty_seed), Err(FairnessError::InvalidInput(_))));

        assert!(!service.lookup(&commit.commitment_id).unwrap().used);
        assert!(service.play(&play_request(&commit.commitment_id, "slots", 10)).is_ok());
    }

    #[test]
    fn test_replay_is_counted_as_conflict() {
        let service = FairnessService::in_memory();
        let commit = service.commit(&CommitRequest { owner_id: "alice".into() }).unwrap();
        let request = play_request(&commit.commitment_id, "roulette", 10);

        service.play(&request).unwrap();
        assert!(matches!(service.play(&request), Err(FairnessError::AlreadyUsed(_))));

        let snapshot = service.metrics().snapshot();
        assert_eq!(snapshot.rounds_played, 1);
        assert_eq!(snapshot.consume_conflicts, 1);
    }

    #[test]
    fn test_reveal_then_verify() {
        let service = FairnessService::in_memory();
        let commit = service.commit(&CommitRequest { owner_id: "alice".into() }).unwrap();
        let reveal = RevealRequest {
            commitment_id: commit.commitment_id.clone(),
        };
        assert!(matches!(service.reveal(&reveal), Err(FairnessError::NotRevealable(_))));

        let played = service.play(&play_request(&commit.commitment_id, "blackjack", 50)).unwrap();
        let seed = service.reveal(&reveal).unwrap().server_seed;

        let response = service.verify(&VerifyRequest {
            game_type: "blackjack".into(),
            client_seed: "client-seed".into(),
            server_seed: seed,
            server_seed_hash: commit.server_seed_hash,
            round_index: played.round_index,
            claimed_outcome: played.outcome,
        });
        assert!(response.verified);
        assert_eq!(service.metrics().snapshot().verifications_passed, 1);
    }

    #[test]
    fn test_lookup_after_play_replays() {
        let service = FairnessService::in_memory();
        let commit = service.commit(&CommitRequest { owner_id: "alice".into() }).unwrap();
        let played = service.play(&play_request(&commit.commitment_id, "poker", 20)).unwrap();

        let public = service.lookup(&commit.commitment_id).unwrap();
        let round = public.round.expect("played commitment carries its round");
        assert_eq!(round.outcome, played.outcome);

        let response = service.verify(&VerifyRequest {
            game_type: round.game_type.id().to_string(),
            client_seed: round.client_seed,
            server_seed: public.server_seed.expect("used commitment reveals its seed"),
            server_seed_hash: public.server_seed_hash,
            round_index: public.round_index,
            claimed_outcome: round.outcome,
        });
        assert!(response.verified);
    }

    #[test]
    fn test_games_catalog() {
        let service = FairnessService::in_memory();
        let ids: Vec<String> = service.games().into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["slots", "roulette", "blackjack", "poker"]);
    }
}
