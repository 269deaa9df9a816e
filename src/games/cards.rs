//! Playing cards and a stream-driven shuffle shared by the card games

use crate::errors::FairnessResult;
use crate::rng::RngStream;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    fn letter(&self) -> char {
        match self {
            Suit::Clubs => 'C',
            Suit::Diamonds => 'D',
            Suit::Hearts => 'H',
            Suit::Spades => 'S',
        }
    }
}

/// Rank runs 2..=14, ace high
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: u8,
    pub suit: Suit,
}

impl Card {
    pub const ACE: u8 = 14;

    fn rank_label(&self) -> &'static str {
        match self.rank {
            2 => "2",
            3 => "3",
            4 => "4",
            5 => "5",
            6 => "6",
            7 => "7",
            8 => "8",
            9 => "9",
            10 => "T",
            11 => "J",
            12 => "Q",
            13 => "K",
            _ => "A",
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank_label(), self.suit.letter())
    }
}

/// Fresh 52-card deck in fixed order: suits C, D, H, S; ranks 2 to ace
pub fn ordered_deck() -> Vec<Card> {
    Suit::ALL
        .iter()
        .flat_map(|&suit| (2..=Card::ACE).map(move |rank| Card { rank, suit }))
        .collect()
}

/// Fisher-Yates over the ordered deck, one stream draw per swap
pub fn shuffled_deck(stream: &mut RngStream) -> FairnessResult<Vec<Card>> {
    let mut deck = ordered_deck();
    for i in (1..deck.len()).rev() {
        let j = stream.next_in_range(0, i as u64 + 1)? as usize;
        deck.swap(i, j);
    }
    Ok(deck)
}
