//! Outcome resolvers
//!
//! Every game consumes the deterministic RNG stream for its round and returns a
//! `GameOutcome`. None of them touch balances.

pub mod blackjack;
pub mod cards;
pub mod poker;
pub mod roulette;
pub mod slots;
pub mod types;

pub use blackjack::Blackjack;
pub use poker::Poker;
pub use roulette::Roulette;
pub use slots::{PayoutTable, SlotMachine};
pub use types::*;

use crate::errors::FairnessResult;
use std::sync::OnceLock;

fn standard_slots() -> &'static SlotMachine {
    static MACHINE: OnceLock<SlotMachine> = OnceLock::new();
    MACHINE.get_or_init(SlotMachine::standard)
}

impl GameType {
    /// The resolver for this variant
    pub fn resolver(&self) -> &'static dyn Game {
        match self {
            GameType::Slots => standard_slots(),
            GameType::Roulette => &Roulette,
            GameType::Blackjack => &Blackjack,
            GameType::Poker => &Poker,
        }
    }

    pub fn play(
        &self,
        bet_amount: u64,
        client_seed: &str,
        server_seed: &str,
        round_index: u64,
    ) -> FairnessResult<GameOutcome> {
        self.resolver().play(bet_amount, client_seed, server_seed, round_index)
    }
}

/// Catalog of every playable game
pub fn available_games() -> Vec<GameInfo> {
    GameType::ALL.iter().map(GameType::info).collect()
}
