//! Three-reel slot machine and its payout table
//!
//! Payouts resolve in a fixed order: exact combination first, then wildcard
//! rules top-to-bottom (longest literal run first, then declaration order),
//! then zero.

use super::types::{Game, GameOutcome, GameType, Multiplier};
use crate::errors::{FairnessError, FairnessResult};
use crate::rng;
use std::cmp::Reverse;
use std::collections::HashMap;

pub const WILDCARD: &str = "*";

/// Upper bound of the raw draw each reel is taken from
const REEL_DRAW_RANGE: u64 = 1_000_000;

/// One position of a payout pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSlot {
    Any,
    Symbol(String),
}

impl PatternSlot {
    fn accepts(&self, symbol: &str) -> bool {
        match self {
            PatternSlot::Any => true,
            PatternSlot::Symbol(s) => s == symbol,
        }
    }

    fn is_literal(&self) -> bool {
        matches!(self, PatternSlot::Symbol(_))
    }
}

/// A wildcard payout rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutRule {
    pub pattern: Vec<PatternSlot>,
    pub multiplier: Multiplier,
    declared_at: usize,
}

impl PayoutRule {
    pub fn matches(&self, reels: &[String]) -> bool {
        self.pattern.len() == reels.len()
            && self.pattern.iter().zip(reels).all(|(slot, symbol)| slot.accepts(symbol))
    }

    fn literal_count(&self) -> usize {
        self.pattern.iter().filter(|slot| slot.is_literal()).count()
    }

    fn longest_literal_run(&self) -> usize {
        let mut best = 0;
        let mut run = 0;
        for slot in &self.pattern {
            if slot.is_literal() {
                run += 1;
                best = best.max(run);
            } else {
                run = 0;
            }
        }
        best
    }

    /// Evaluation order: longest contiguous literal run, then declaration order
    fn priority(&self) -> (Reverse<usize>, usize) {
        (Reverse(self.longest_literal_run()), self.declared_at)
    }

    /// Rules with the same literal positions count and run length are equally specific
    fn specificity(&self) -> (usize, usize) {
        (self.literal_count(), self.longest_literal_run())
    }

    /// Some reel combination satisfies both rules
    fn overlaps(&self, other: &PayoutRule) -> bool {
        self.pattern.iter().zip(&other.pattern).all(|(a, b)| match (a, b) {
            (PatternSlot::Symbol(x), PatternSlot::Symbol(y)) => x == y,
            _ => true,
        })
    }

    pub fn pattern_string(&self) -> String {
        self.pattern
            .iter()
            .map(|slot| match slot {
                PatternSlot::Any => WILDCARD,
                PatternSlot::Symbol(s) => s.as_str(),
            })
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Precompiled payout rules for a fixed reel count
#[derive(Debug, Clone)]
pub struct PayoutTable {
    width: usize,
    exact: HashMap<Vec<String>, Multiplier>,
    wildcard: Vec<PayoutRule>,
}

impl PayoutTable {
    /// Compile `("A-B-*", multiplier)` entries, in declaration order.
    pub fn parse(width: usize, entries: &[(&str, Multiplier)]) -> FairnessResult<Self> {
        if width == 0 {
            return Err(FairnessError::InvalidInput("payout table width must be positive".to_string()));
        }

        let mut exact = HashMap::new();
        let mut wildcard: Vec<PayoutRule> = Vec::new();

        for (declared_at, (raw, multiplier)) in entries.iter().enumerate() {
            let pattern: Vec<PatternSlot> = raw
                .split('-')
                .map(|part| match part.trim() {
                    WILDCARD => PatternSlot::Any,
                    s => PatternSlot::Symbol(s.to_string()),
                })
                .collect();

            if pattern.len() != width {
                return Err(FairnessError::InvalidInput(format!(
                    "pattern '{}' has {} positions, expected {}",
                    raw,
                    pattern.len(),
                    width
                )));
            }
            if pattern.iter().any(|slot| matches!(slot, PatternSlot::Symbol(s) if s.is_empty())) {
                return Err(FairnessError::InvalidInput(format!("pattern '{}' has an empty symbol", raw)));
            }

            if pattern.iter().all(PatternSlot::is_literal) {
                let key: Vec<String> = pattern
                    .into_iter()
                    .filter_map(|slot| match slot {
                        PatternSlot::Symbol(s) => Some(s),
                        PatternSlot::Any => None,
                    })
                    .collect();
                if exact.insert(key, *multiplier).is_some() {
                    return Err(FairnessError::InvalidInput(format!("duplicate pattern '{}'", raw)));
                }
            } else {
                wildcard.push(PayoutRule {
                    pattern,
                    multiplier: *multiplier,
                    declared_at,
                });
            }
        }

        Self::check_ambiguity(&wildcard)?;
        wildcard.sort_by_key(PayoutRule::priority);

        Ok(Self { width, exact, wildcard })
    }

    /// Rules of equal specificity that can both match must agree on the payout.
    /// Overlaps between rules of different specificity are settled by `priority`.
    fn check_ambiguity(rules: &[PayoutRule]) -> FairnessResult<()> {
        for (i, a) in rules.iter().enumerate() {
            for b in &rules[i + 1..] {
                if a.pattern == b.pattern {
                    return Err(FairnessError::InvalidInput(format!(
                        "duplicate pattern '{}'",
                        a.pattern_string()
                    )));
                }
                if a.specificity() == b.specificity() && a.multiplier != b.multiplier && a.overlaps(b) {
                    return Err(FairnessError::InvalidInput(format!(
                        "patterns '{}' and '{}' overlap with different payouts",
                        a.pattern_string(),
                        b.pattern_string()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Wildcard rules in evaluation order
    pub fn wildcard_rules(&self) -> &[PayoutRule] {
        &self.wildcard
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.exact
            .keys()
            .flat_map(|key| key.iter().map(String::as_str))
            .chain(self.wildcard.iter().flat_map(|rule| {
                rule.pattern.iter().filter_map(|slot| match slot {
                    PatternSlot::Symbol(s) => Some(s.as_str()),
                    PatternSlot::Any => None,
                })
            }))
    }

    pub fn resolve(&self, reels: &[String]) -> Multiplier {
        if let Some(multiplier) = self.exact.get(reels) {
            return *multiplier;
        }

        self.wildcard
            .iter()
            .find(|rule| rule.matches(reels))
            .map(|rule| rule.multiplier)
            .unwrap_or(Multiplier::ZERO)
    }
}

/// Classic three-reel machine
#[derive(Debug, Clone)]
pub struct SlotMachine {
    symbols: Vec<String>,
    table: PayoutTable,
}

impl SlotMachine {
    pub const REELS: usize = 3;

    pub fn new(symbols: Vec<String>, table: PayoutTable) -> FairnessResult<Self> {
        if symbols.is_empty() {
            return Err(FairnessError::InvalidInput("slot machine needs at least one symbol".to_string()));
        }
        if table.width() != Self::REELS {
            return Err(FairnessError::InvalidInput(format!(
                "payout table width {} does not match {} reels",
                table.width(),
                Self::REELS
            )));
        }
        if let Some(unknown) = table.symbols().find(|s| !symbols.iter().any(|known| known == s)) {
            return Err(FairnessError::InvalidInput(format!(
                "payout table references unknown symbol '{}'",
                unknown
            )));
        }

        Ok(Self { symbols, table })
    }

    /// The standard symbol set and payout table
    pub fn standard() -> Self {
        let symbols = ["7", "BAR", "Cherry", "Lemon", "Orange", "Plum", "Bell"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let table = PayoutTable::parse(
            Self::REELS,
            &[
                ("7-7-7", Multiplier::whole(10)),
                ("BAR-BAR-BAR", Multiplier::whole(5)),
                ("Cherry-Cherry-Cherry", Multiplier::whole(3)),
                ("Lemon-Lemon-Lemon", Multiplier::whole(2)),
                ("Orange-Orange-Orange", Multiplier::whole(2)),
                ("Plum-Plum-Plum", Multiplier::whole(2)),
                ("Bell-Bell-Bell", Multiplier::whole(2)),
                ("Cherry-Cherry-*", Multiplier::whole(1)),
                ("Cherry-*-Cherry", Multiplier::whole(1)),
                ("*-Cherry-Cherry", Multiplier::whole(1)),
            ],
        );

        match table.and_then(|table| Self::new(symbols, table)) {
            Ok(machine) => machine,
            Err(e) => unreachable!("standard slot table is valid: {}", e),
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn payout_table(&self) -> &PayoutTable {
        &self.table
    }

    /// Map the raw draws to reel symbols
    pub fn spin(&self, client_seed: &str, server_seed: &str, round_index: u64) -> FairnessResult<Vec<String>> {
        let draws = rng::derive(server_seed, client_seed, round_index, Self::REELS, 0, REEL_DRAW_RANGE)?;
        let n = self.symbols.len() as u64;
        Ok(draws
            .into_iter()
            .map(|value| self.symbols[(value % n) as usize].clone())
            .collect())
    }
}

impl Game for SlotMachine {
    fn game_type(&self) -> GameType {
        GameType::Slots
    }

    fn play(
        &self,
        bet_amount: u64,
        client_seed: &str,
        server_seed: &str,
        round_index: u64,
    ) -> FairnessResult<GameOutcome> {
        let reels = self.spin(client_seed, server_seed, round_index)?;
        let multiplier = self.table.resolve(&reels);
        GameOutcome::new(reels, multiplier, bet_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reels(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_match_wins() {
        let machine = SlotMachine::standard();
        assert_eq!(machine.payout_table().resolve(&reels(&["7", "7", "7"])), Multiplier::whole(10));
        assert_eq!(
            machine.payout_table().resolve(&reels(&["Cherry", "Cherry", "Cherry"])),
            Multiplier::whole(3)
        );
    }

    #[test]
    fn test_wildcard_match() {
        let table = SlotMachine::standard().payout_table().clone();
        assert_eq!(table.resolve(&reels(&["Cherry", "Cherry", "Lemon"])), Multiplier::whole(1));
        assert_eq!(table.resolve(&reels(&["Cherry", "Bell", "Cherry"])), Multiplier::whole(1));
        assert_eq!(table.resolve(&reels(&["Plum", "Cherry", "Cherry"])), Multiplier::whole(1));
    }

    #[test]
    fn test_no_match_is_zero() {
        let table = SlotMachine::standard().payout_table().clone();
        assert_eq!(table.resolve(&reels(&["Lemon", "7", "Orange"])), Multiplier::ZERO);
        assert_eq!(table.resolve(&reels(&["Cherry", "7", "Orange"])), Multiplier::ZERO);
    }

    #[test]
    fn test_wildcard_priority_order() {
        let table = SlotMachine::standard().payout_table().clone();
        let order: Vec<String> = table.wildcard_rules().iter().map(PayoutRule::pattern_string).collect();
        // Contiguous literal runs first, then declaration order.
        assert_eq!(order, vec!["Cherry-Cherry-*", "*-Cherry-Cherry", "Cherry-*-Cherry"]);
    }

    #[test]
    fn test_priority_is_tie_break_for_overlapping_rules() {
        let table = PayoutTable::parse(
            3,
            &[
                ("A-*-*", Multiplier::whole(1)),
                ("A-B-*", Multiplier::whole(4)),
            ],
        )
        .unwrap();

        // The longer literal run wins even though it was declared later.
        assert_eq!(table.resolve(&reels(&["A", "B", "C"])), Multiplier::whole(4));
        assert_eq!(table.resolve(&reels(&["A", "C", "C"])), Multiplier::whole(1));
    }

    #[test]
    fn test_equal_runs_fall_back_to_declaration_order() {
        let table = PayoutTable::parse(
            3,
            &[
                ("A-*-*", Multiplier::whole(1)),
                ("A-*-B", Multiplier::whole(4)),
            ],
        )
        .unwrap();

        let order: Vec<String> = table.wildcard_rules().iter().map(PayoutRule::pattern_string).collect();
        assert_eq!(order, vec!["A-*-*", "A-*-B"]);
        // Both rules have a run of one, so the first declared rule wins.
        assert_eq!(table.resolve(&reels(&["A", "C", "B"])), Multiplier::whole(1));

        let reversed = PayoutTable::parse(
            3,
            &[
                ("A-*-B", Multiplier::whole(4)),
                ("A-*-*", Multiplier::whole(1)),
            ],
        )
        .unwrap();
        assert_eq!(reversed.resolve(&reels(&["A", "C", "B"])), Multiplier::whole(4));
    }

    #[test]
    fn test_ambiguous_rules_rejected() {
        let err = PayoutTable::parse(
            3,
            &[
                ("A-*-*", Multiplier::whole(1)),
                ("*-*-B", Multiplier::whole(2)),
            ],
        );
        assert!(matches!(err, Err(FairnessError::InvalidInput(_))));
    }

    #[test]
    fn test_malformed_tables_rejected() {
        assert!(PayoutTable::parse(3, &[("A-B", Multiplier::whole(1))]).is_err());
        assert!(PayoutTable::parse(
            3,
            &[("A-A-A", Multiplier::whole(1)), ("A-A-A", Multiplier::whole(2))]
        )
        .is_err());
        assert!(PayoutTable::parse(3, &[("A--A", Multiplier::whole(1))]).is_err());

        let table = PayoutTable::parse(3, &[("Z-Z-Z", Multiplier::whole(1))]).unwrap();
        assert!(SlotMachine::new(vec!["A".to_string()], table).is_err());
    }

    #[test]
    fn test_play_draws_three_known_symbols() {
        let machine = SlotMachine::standard();
        let outcome = machine.play(10, "client", "server", 0).unwrap();

        assert_eq!(outcome.symbols.len(), 3);
        assert!(outcome.symbols.iter().all(|s| machine.symbols().contains(s)));
        assert_eq!(outcome.payout_multiplier, machine.payout_table().resolve(&outcome.symbols));
        assert_eq!(outcome.payout_amount, outcome.payout_multiplier.apply(10).unwrap());
    }

    #[test]
    fn test_spin_uses_rng_stream() {
        let machine = SlotMachine::standard();
        let draws = rng::derive("server", "client", 4, 3, 0, REEL_DRAW_RANGE).unwrap();
        let expected: Vec<String> = draws
            .iter()
            .map(|v| machine.symbols()[(*v % 7) as usize].clone())
            .collect();

        assert_eq!(machine.spin("client", "server", 4).unwrap(), expected);
    }
}
