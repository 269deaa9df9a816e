//! Stateless outcome verification
//!
//! Anyone holding the revealed seed can replay a round: check the seed against
//! its published commitment, re-run the resolver with a zero bet, and compare
//! the bet-independent result.

use crate::commitment::commitment_matches;
use crate::games::{GameOutcome, GameType};
use serde::{Deserialize, Serialize};

/// Full account of one verification run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationRecord {
    pub game_type: String,
    pub round_index: u64,
    pub claimed: GameOutcome,
    /// None when the game type is unknown or the inputs cannot be replayed
    pub recomputed: Option<GameOutcome>,
    pub commitment_valid: bool,
    pub result_match: bool,
}

impl VerificationRecord {
    pub fn verified(&self) -> bool {
        self.commitment_valid && self.result_match
    }
}

/// Replay a round and report every check
pub fn verify_record(
    game_type: &str,
    client_seed: &str,
    server_seed: &str,
    server_seed_hash: &str,
    round_index: u64,
    claimed: &GameOutcome,
) -> VerificationRecord {
    let commitment_valid = commitment_matches(server_seed, server_seed_hash);

    let recomputed = match game_type.parse::<GameType>() {
        Ok(game) => match game.play(0, client_seed, server_seed, round_index) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::debug!(game_type, round_index, error = %e, "Replay failed");
                None
            }
        },
        Err(_) => {
            tracing::debug!(game_type, "Verification requested for unknown game");
            None
        }
    };

    let result_match = recomputed
        .as_ref()
        .is_some_and(|outcome| outcome.same_result(claimed));

    if !commitment_valid || !result_match {
        tracing::debug!(
            game_type,
            round_index,
            commitment_valid,
            result_match,
            "Outcome failed verification"
        );
    }

    VerificationRecord {
        game_type: game_type.to_string(),
        round_index,
        claimed: claimed.clone(),
        recomputed,
        commitment_valid,
        result_match,
    }
}

/// True only when the seed matches its commitment and the replayed result
/// equals the claim
pub fn verify(
    game_type: &str,
    client_seed: &str,
    server_seed: &str,
    server_seed_hash: &str,
    round_index: u64,
    claimed: &GameOutcome,
) -> bool {
    verify_record(
        game_type,
        client_seed,
        server_seed,
        server_seed_hash,
        round_index,
        claimed,
    )
    .verified()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::{hash_server_seed, SeedPair};
    use crate::games::Multiplier;

    fn played_round(game: GameType) -> (SeedPair, GameOutcome) {
        let pair = SeedPair::issue("alice", 4, 32);
        let outcome = game.play(25, "lucky-client", &pair.server_seed, pair.round_index).unwrap();
        (pair, outcome)
    }

    #[test]
    fn test_every_game_round_trips() {
        for game in GameType::ALL {
            let (pair, outcome) = played_round(game);
            assert!(verify(
                game.id(),
                "lucky-client",
                &pair.server_seed,
                &pair.server_seed_hash,
                pair.round_index,
                &outcome
            ));
        }
    }

    #[test]
    fn test_tampered_seed_fails_commitment() {
        let (pair, outcome) = played_round(GameType::Slots);
        let mut bytes = pair.server_seed.clone().into_bytes();
        bytes[10] ^= 0x01;
        let tampered = String::from_utf8(bytes).unwrap();

        let record = verify_record("slots", "lucky-client", &tampered, &pair.server_seed_hash, 4, &outcome);
        assert!(!record.commitment_valid);
        assert!(!record.verified());
    }

    #[test]
    fn test_mutated_fields_fail() {
        // Five dealt cards make an accidental collision practically impossible.
        let (pair, outcome) = played_round(GameType::Poker);
        let check = |client: &str, round: u64, claimed: &GameOutcome| {
            verify("poker", client, &pair.server_seed, &pair.server_seed_hash, round, claimed)
        };

        assert!(!check("other-client", 4, &outcome));
        assert!(!check("lucky-client", 5, &outcome));

        let mut wrong_multiplier = outcome.clone();
        wrong_multiplier.payout_multiplier = Multiplier::from_hundredths(outcome.payout_multiplier.hundredths() + 1);
        assert!(!check("lucky-client", 4, &wrong_multiplier));

        let mut wrong_symbols = outcome.clone();
        wrong_symbols.symbols.reverse();
        wrong_symbols.symbols[0] = "Nothing".to_string();
        assert!(!check("lucky-client", 4, &wrong_symbols));
    }

    #[test]
    fn test_other_seed_with_its_own_hash_fails_result() {
        let (_, outcome) = played_round(GameType::Poker);
        let other = "f".repeat(64);
        let record = verify_record("poker", "lucky-client", &other, &hash_server_seed(&other), 4, &outcome);

        assert!(record.commitment_valid);
        assert!(!record.result_match);
    }

    #[test]
    fn test_unknown_game_is_rejected() {
        let (pair, outcome) = played_round(GameType::Slots);
        let record = verify_record(
            "craps",
            "lucky-client",
            &pair.server_seed,
            &pair.server_seed_hash,
            4,
            &outcome,
        );
        assert!(record.recomputed.is_none());
        assert!(!record.verified());
    }

    #[test]
    fn test_bet_fields_are_ignored() {
        let (pair, mut outcome) = played_round(GameType::Roulette);
        outcome.payout_amount = 0;
        outcome.win = false;
        assert!(verify("roulette", "lucky-client", &pair.server_seed, &pair.server_seed_hash, 4, &outcome));
    }
}
