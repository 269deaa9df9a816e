use crate::errors::{FairnessError, FairnessResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Supported game types
///
/// A closed set: every variant obeys the same commit-reveal contract and is
/// dispatched with a `match`, never through a runtime registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Slots,
    Roulette,
    Blackjack,
    Poker,
}

impl GameType {
    pub const ALL: [GameType; 4] = [
        GameType::Slots,
        GameType::Roulette,
        GameType::Blackjack,
        GameType::Poker,
    ];

    /// Stable identifier used on the wire
    pub fn id(&self) -> &'static str {
        match self {
            GameType::Slots => "slots",
            GameType::Roulette => "roulette",
            GameType::Blackjack => "blackjack",
            GameType::Poker => "poker",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GameType::Slots => "Slot Machine",
            GameType::Roulette => "Roulette",
            GameType::Blackjack => "Blackjack",
            GameType::Poker => "Poker",
        }
    }

    /// Inclusive (min, max) wager accepted for live play
    pub fn bet_limits(&self) -> (u64, u64) {
        match self {
            GameType::Slots => (1, 100),
            GameType::Roulette => (1, 1000),
            GameType::Blackjack => (5, 500),
            GameType::Poker => (10, 1000),
        }
    }

    pub fn info(&self) -> GameInfo {
        let (min_bet, max_bet) = self.bet_limits();
        GameInfo {
            id: self.id().to_string(),
            name: self.display_name().to_string(),
            min_bet,
            max_bet,
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for GameType {
    type Err = FairnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        GameType::ALL
            .iter()
            .copied()
            .find(|game| game.id() == wanted)
            .ok_or_else(|| FairnessError::UnknownGameType(s.to_string()))
    }
}

/// Catalog entry for a playable game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameInfo {
    pub id: String,
    pub name: String,
    pub min_bet: u64,
    pub max_bet: u64,
}

/// Payout factor applied to a wager, in hundredths (`250` is 2.5x)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Multiplier(u64);

impl Multiplier {
    pub const ZERO: Multiplier = Multiplier(0);
    const SCALE: u64 = 100;

    pub const fn from_hundredths(hundredths: u64) -> Self {
        Multiplier(hundredths)
    }

    pub const fn whole(factor: u64) -> Self {
        Multiplier(factor * Self::SCALE)
    }

    pub fn hundredths(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `floor(bet_amount * self)`
    pub fn apply(&self, bet_amount: u64) -> FairnessResult<u64> {
        let scaled = bet_amount as u128 * self.0 as u128 / Self::SCALE as u128;
        u64::try_from(scaled).map_err(|_| {
            FairnessError::InvalidInput(format!(
                "payout for bet {} at {}x overflows",
                bet_amount, self
            ))
        })
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        match frac {
            0 => write!(f, "{}", whole),
            f_ if f_ % 10 == 0 => write!(f, "{}.{}", whole, f_ / 10),
            f_ => write!(f, "{}.{:02}", whole, f_),
        }
    }
}

impl FromStr for Multiplier {
    type Err = FairnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FairnessError::InvalidInput(format!("invalid multiplier '{}'", s));
        let s = s.trim().trim_end_matches('x');
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(Self::SCALE)
            .and_then(|w| w.checked_add(frac))
            .map(Multiplier)
            .ok_or_else(invalid)
    }
}

impl Serialize for Multiplier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Multiplier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Result of one resolved round. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameOutcome {
    /// Reel symbols, pocket, or dealt cards in draw order
    pub symbols: Vec<String>,
    pub payout_multiplier: Multiplier,
    pub payout_amount: u64,
    pub win: bool,
}

impl GameOutcome {
    pub fn new(symbols: Vec<String>, payout_multiplier: Multiplier, bet_amount: u64) -> FairnessResult<Self> {
        let payout_amount = payout_multiplier.apply(bet_amount)?;
        Ok(Self {
            symbols,
            payout_multiplier,
            payout_amount,
            win: payout_amount > 0,
        })
    }

    /// Compare the bet-independent part of two outcomes
    pub fn same_result(&self, other: &GameOutcome) -> bool {
        self.symbols == other.symbols && self.payout_multiplier == other.payout_multiplier
    }
}

/// Capability shared by every game variant
pub trait Game: Send + Sync {
    fn game_type(&self) -> GameType;

    /// Resolve one round. Pure: same inputs, same outcome.
    fn play(
        &self,
        bet_amount: u64,
        client_seed: &str,
        server_seed: &str,
        round_index: u64,
    ) -> FairnessResult<GameOutcome>;
}
