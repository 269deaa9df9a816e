//! Five-card video poker, no holds, "jacks or better" paytable

use super::cards::{shuffled_deck, Card};
use super::types::{Game, GameOutcome, GameType, Multiplier};
use crate::errors::FairnessResult;
use crate::rng::RngStream;
use std::collections::HashMap;

const HAND_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PokerHand {
    Nothing,
    JacksOrBetter,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl PokerHand {
    pub fn multiplier(&self) -> Multiplier {
        match self {
            PokerHand::RoyalFlush => Multiplier::whole(250),
            PokerHand::StraightFlush => Multiplier::whole(50),
            PokerHand::FourOfAKind => Multiplier::whole(25),
            PokerHand::FullHouse => Multiplier::whole(9),
            PokerHand::Flush => Multiplier::whole(6),
            PokerHand::Straight => Multiplier::whole(4),
            PokerHand::ThreeOfAKind => Multiplier::whole(3),
            PokerHand::TwoPair => Multiplier::whole(2),
            PokerHand::JacksOrBetter => Multiplier::whole(1),
            PokerHand::Nothing => Multiplier::ZERO,
        }
    }
}

/// Classify a five-card hand
pub fn evaluate(cards: &[Card]) -> PokerHand {
    let mut counts: HashMap<u8, usize> = HashMap::new();
    for card in cards {
        *counts.entry(card.rank).or_insert(0) += 1;
    }
    let mut groups: Vec<(usize, u8)> = counts.iter().map(|(rank, n)| (*n, *rank)).collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let flush = cards.windows(2).all(|pair| pair[0].suit == pair[1].suit);

    let mut ranks: Vec<u8> = cards.iter().map(|card| card.rank).collect();
    ranks.sort_unstable();
    let distinct = groups.len() == cards.len();
    let wheel = ranks == [2, 3, 4, 5, Card::ACE];
    let straight = distinct && (wheel || ranks[ranks.len() - 1] - ranks[0] == 4);

    match (straight, flush) {
        (true, true) if ranks[0] == 10 => return PokerHand::RoyalFlush,
        (true, true) => return PokerHand::StraightFlush,
        _ => {}
    }

    match (groups[0].0, groups.get(1).map(|g| g.0)) {
        (4, _) => PokerHand::FourOfAKind,
        (3, Some(2)) => PokerHand::FullHouse,
        _ if flush => PokerHand::Flush,
        _ if straight => PokerHand::Straight,
        (3, _) => PokerHand::ThreeOfAKind,
        (2, Some(2)) => PokerHand::TwoPair,
        (2, _) if groups[0].1 >= 11 => PokerHand::JacksOrBetter,
        _ => PokerHand::Nothing,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Poker;

impl Poker {
    pub fn deal(&self, client_seed: &str, server_seed: &str, round_index: u64) -> FairnessResult<Vec<Card>> {
        let mut stream = RngStream::new(server_seed, client_seed, round_index)?;
        let mut deck = shuffled_deck(&mut stream)?;
        deck.truncate(HAND_SIZE);
        Ok(deck)
    }
}

impl Game for Poker {
    fn game_type(&self) -> GameType {
        GameType::Poker
    }

    fn play(
        &self,
        bet_amount: u64,
        client_seed: &str,
        server_seed: &str,
        round_index: u64,
    ) -> FairnessResult<GameOutcome> {
        let hand = self.deal(client_seed, server_seed, round_index)?;
        let rank = evaluate(&hand);
        let symbols = hand.iter().map(Card::to_string).collect();

        GameOutcome::new(symbols, rank.multiplier(), bet_amount)
    }
}
