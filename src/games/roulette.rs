//! Single-zero roulette with the house's even-money wager on red

use super::types::{Game, GameOutcome, GameType, Multiplier};
use crate::errors::FairnessResult;
use crate::rng;

const POCKETS: u64 = 37;
const RED_POCKETS: [u64; 18] = [1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colour {
    Green,
    Red,
    Black,
}

impl Colour {
    pub fn of(pocket: u64) -> Self {
        if pocket == 0 {
            Colour::Green
        } else if RED_POCKETS.contains(&pocket) {
            Colour::Red
        } else {
            Colour::Black
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Colour::Green => "green",
            Colour::Red => "red",
            Colour::Black => "black",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Roulette;

impl Roulette {
    pub fn spin(&self, client_seed: &str, server_seed: &str, round_index: u64) -> FairnessResult<u64> {
        let draws = rng::derive(server_seed, client_seed, round_index, 1, 0, POCKETS)?;
        Ok(draws[0])
    }
}

impl Game for Roulette {
    fn game_type(&self) -> GameType {
        GameType::Roulette
    }

    fn play(
        &self,
        bet_amount: u64,
        client_seed: &str,
        server_seed: &str,
        round_index: u64,
    ) -> FairnessResult<GameOutcome> {
        let pocket = self.spin(client_seed, server_seed, round_index)?;
        let colour = Colour::of(pocket);
        let multiplier = match colour {
            Colour::Red => Multiplier::whole(2),
            Colour::Green | Colour::Black => Multiplier::ZERO,
        };

        GameOutcome::new(vec![pocket.to_string(), colour.name().to_string()], multiplier, bet_amount)
    }
}
