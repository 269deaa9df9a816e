//! Engine counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub struct EngineMetrics {
    start_time: Instant,
    commitments_issued: AtomicU64,
    rounds_played: AtomicU64,
    consume_conflicts: AtomicU64,
    owner_mismatches: AtomicU64,
    verifications_passed: AtomicU64,
    verifications_failed: AtomicU64,
    total_wagered: AtomicU64,
    total_paid_out: AtomicU64,
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub commitments_issued: u64,
    pub rounds_played: u64,
    pub consume_conflicts: u64,
    pub owner_mismatches: u64,
    pub verifications_passed: u64,
    pub verifications_failed: u64,
    pub total_wagered: u64,
    pub total_paid_out: u64,
    /// Paid out over wagered; 0 before the first wager
    pub observed_rtp: f64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            commitments_issued: AtomicU64::new(0),
            rounds_played: AtomicU64::new(0),
            consume_conflicts: AtomicU64::new(0),
            owner_mismatches: AtomicU64::new(0),
            verifications_passed: AtomicU64::new(0),
            verifications_failed: AtomicU64::new(0),
            total_wagered: AtomicU64::new(0),
            total_paid_out: AtomicU64::new(0),
        }
    }

    pub fn record_commitment(&self) {
        self.commitments_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_round(&self, bet_amount: u64, payout_amount: u64) {
        self.rounds_played.fetch_add(1, Ordering::Relaxed);
        self.total_wagered.fetch_add(bet_amount, Ordering::Relaxed);
        self.total_paid_out.fetch_add(payout_amount, Ordering::Relaxed);
    }

    pub fn record_conflict(&self) {
        self.consume_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_owner_mismatch(&self) {
        self.owner_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_verification(&self, passed: bool) {
        let counter = if passed {
            &self.verifications_passed
        } else {
            &self.verifications_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_runtime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_wagered = self.total_wagered.load(Ordering::Relaxed);
        let total_paid_out = self.total_paid_out.load(Ordering::Relaxed);
        let observed_rtp = if total_wagered == 0 {
            0.0
        } else {
            total_paid_out as f64 / total_wagered as f64
        };

        MetricsSnapshot {
            uptime_secs: self.total_runtime().as_secs(),
            commitments_issued: self.commitments_issued.load(Ordering::Relaxed),
            rounds_played: self.rounds_played.load(Ordering::Relaxed),
            consume_conflicts: self.consume_conflicts.load(Ordering::Relaxed),
            owner_mismatches: self.owner_mismatches.load(Ordering::Relaxed),
            verifications_passed: self.verifications_passed.load(Ordering::Relaxed),
            verifications_failed: self.verifications_failed.load(Ordering::Relaxed),
            total_wagered,
            total_paid_out,
            observed_rtp,
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
