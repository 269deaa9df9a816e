//! Return-to-player simulation
//!
//! Plays many complete rounds (commit, play, reveal, verify) over fresh seeds on
//! blocking workers, bounded by a semaphore, and aggregates the results.

use crate::errors::{FairnessError, FairnessResult};
use crate::games::GameType;
use crate::service::{CommitRequest, FairnessService, PlayRequest, RevealRequest, VerifyRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use uuid::Uuid;

const SIMULATION_OWNER: &str = "simulator";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub game_type: GameType,
    pub rounds: u64,
    pub failed_rounds: u64,
    pub wins: u64,
    pub verified: u64,
    pub total_bet: u64,
    pub total_payout: u64,
    pub win_rate: f64,
    pub rtp: f64,
    pub execution_time_ms: u128,
}

struct RoundSummary {
    payout_amount: u64,
    win: bool,
    verified: bool,
}

fn play_round(service: &FairnessService, game: GameType, bet_amount: u64) -> FairnessResult<RoundSummary> {
    let commit = service.commit(&CommitRequest {
        owner_id: SIMULATION_OWNER.to_string(),
    })?;
    let client_seed = Uuid::new_v4().to_string();

    let played = service.play(&PlayRequest {
        commitment_id: commit.commitment_id.clone(),
        owner_id: SIMULATION_OWNER.to_string(),
        game_type: game.id().to_string(),
        client_seed: client_seed.clone(),
        bet_amount,
    })?;
    let revealed = service.reveal(&RevealRequest {
        commitment_id: commit.commitment_id,
    })?;

    let verified = service
        .verify(&VerifyRequest {
            game_type: game.id().to_string(),
            client_seed,
            server_seed: revealed.server_seed,
            server_seed_hash: commit.server_seed_hash,
            round_index: played.round_index,
            claimed_outcome: played.outcome.clone(),
        })
        .verified;

    Ok(RoundSummary {
        payout_amount: played.outcome.payout_amount,
        win: played.outcome.win,
        verified,
    })
}

/// Run `rounds` full rounds of `game` at `bet_amount`
pub async fn simulate(
    service: FairnessService,
    game: GameType,
    rounds: u64,
    bet_amount: u64,
    concurrency: usize,
) -> FairnessResult<SimulationReport> {
    if rounds == 0 {
        return Err(FairnessError::InvalidInput("rounds must be positive".to_string()));
    }

    let start = Instant::now();
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(rounds as usize);

    for _ in 0..rounds {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| FairnessError::InvalidInput(format!("simulation aborted: {}", e)))?;
        let service = service.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            play_round(&service, game, bet_amount)
        }));
    }

    let mut report = SimulationReport {
        game_type: game,
        rounds,
        failed_rounds: 0,
        wins: 0,
        verified: 0,
        total_bet: 0,
        total_payout: 0,
        win_rate: 0.0,
        rtp: 0.0,
        execution_time_ms: 0,
    };

    for handle in handles {
        match handle.await {
            Ok(Ok(round)) => {
                report.total_bet += bet_amount;
                report.total_payout += round.payout_amount;
                report.wins += u64::from(round.win);
                report.verified += u64::from(round.verified);
            }
            Ok(Err(e)) => {
                tracing::warn!(game_type = %game, error = %e, "Simulated round failed");
                report.failed_rounds += 1;
            }
            Err(e) => {
                tracing::warn!(game_type = %game, error = %e, "Simulation worker panicked");
                report.failed_rounds += 1;
            }
        }
    }

    let completed = rounds - report.failed_rounds;
    if completed > 0 {
        report.win_rate = report.wins as f64 / completed as f64;
    }
    if report.total_bet > 0 {
        report.rtp = report.total_payout as f64 / report.total_bet as f64;
    }
    report.execution_time_ms = start.elapsed().as_millis();

    tracing::info!(
        game_type = %game,
        rounds,
        failed = report.failed_rounds,
        rtp = report.rtp,
        "Simulation finished"
    );

    Ok(report)
}
