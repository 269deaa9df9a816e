//! Auto-played blackjack: player and dealer both draw to 17

use super::cards::{shuffled_deck, Card};
use super::types::{Game, GameOutcome, GameType, Multiplier};
use crate::errors::{FairnessError, FairnessResult};
use crate::rng::RngStream;

const DRAW_TO: u8 = 17;

/// Best total for a hand, counting aces as 11 where that does not bust
pub fn hand_value(cards: &[Card]) -> u8 {
    let mut total: u8 = 0;
    let mut soft_aces = 0;
    for card in cards {
        total += match card.rank {
            Card::ACE => {
                soft_aces += 1;
                11
            }
            11..=13 => 10,
            rank => rank,
        };
    }
    while total > 21 && soft_aces > 0 {
        total -= 10;
        soft_aces -= 1;
    }
    total
}

fn is_natural(cards: &[Card]) -> bool {
    cards.len() == 2 && hand_value(cards) == 21
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandResult {
    Blackjack,
    Win,
    Push,
    Loss,
}

impl HandResult {
    pub fn multiplier(&self) -> Multiplier {
        match self {
            HandResult::Blackjack => Multiplier::from_hundredths(250),
            HandResult::Win => Multiplier::whole(2),
            HandResult::Push => Multiplier::whole(1),
            HandResult::Loss => Multiplier::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DealtHand {
    pub player: Vec<Card>,
    pub dealer: Vec<Card>,
    pub result: HandResult,
}

fn draw(shoe: &mut dyn Iterator<Item = Card>) -> FairnessResult<Card> {
    shoe.next()
        .ok_or_else(|| FairnessError::InvalidInput("blackjack shoe exhausted".to_string()))
}

/// Deal and play out both hands from `shoe` in order
fn play_out(shoe: &mut dyn Iterator<Item = Card>) -> FairnessResult<DealtHand> {
    let mut player = Vec::new();
    let mut dealer = Vec::new();
    player.push(draw(shoe)?);
    dealer.push(draw(shoe)?);
    player.push(draw(shoe)?);
    dealer.push(draw(shoe)?);

    let result = match (is_natural(&player), is_natural(&dealer)) {
        (true, true) => HandResult::Push,
        (true, false) => HandResult::Blackjack,
        (false, true) => HandResult::Loss,
        (false, false) => {
            while hand_value(&player) < DRAW_TO {
                player.push(draw(shoe)?);
            }
            if hand_value(&player) > 21 {
                HandResult::Loss
            } else {
                while hand_value(&dealer) < DRAW_TO {
                    dealer.push(draw(shoe)?);
                }
                let (p, d) = (hand_value(&player), hand_value(&dealer));
                if d > 21 || p > d {
                    HandResult::Win
                } else if p == d {
                    HandResult::Push
                } else {
                    HandResult::Loss
                }
            }
        }
    };

    Ok(DealtHand { player, dealer, result })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Blackjack;

impl Blackjack {
    pub fn deal(&self, client_seed: &str, server_seed: &str, round_index: u64) -> FairnessResult<DealtHand> {
        let mut stream = RngStream::new(server_seed, client_seed, round_index)?;
        let mut shoe = shuffled_deck(&mut stream)?.into_iter();
        play_out(&mut shoe)
    }
}

impl Game for Blackjack {
    fn game_type(&self) -> GameType {
        GameType::Blackjack
    }

    fn play(
        &self,
        bet_amount: u64,
        client_seed: &str,
        server_seed: &str,
        round_index: u64,
    ) -> FairnessResult<GameOutcome> {
        let hand = self.deal(client_seed, server_seed, round_index)?;
        let symbols = hand
            .player
            .iter()
            .map(|card| format!("P:{}", card))
            .chain(hand.dealer.iter().map(|card| format!("D:{}", card)))
            .collect();

        GameOutcome::new(symbols, hand.result.multiplier(), bet_amount)
    }
}
