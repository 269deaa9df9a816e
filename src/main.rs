//! fairspin command-line front end
//!
//! Operates the fairness service against the configured commitment store and
//! prints JSON results on stdout. Logs go to stderr.

use clap::{Parser, Subcommand};
use fairspin::config::{ConfigLoader, FairspinConfig, StorageBackend};
use fairspin::service::{
    CommitRequest, ErrorBody, FairnessService, PlayRequest, RevealRequest, VerifyRequest,
};
use fairspin::{rng, simulation, FairnessResult, GameOutcome, GameType, Multiplier, ServiceFactory};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fairspin")]
#[command(about = "Provably-fair outcome engine", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue a seed commitment
    Commit {
        #[arg(long)]
        owner: String,
    },
    /// Play one round against a commitment
    Play {
        #[arg(long)]
        commitment: String,
        #[arg(long)]
        owner: String,
        #[arg(long, default_value = "slots")]
        game: String,
        #[arg(long)]
        client_seed: String,
        #[arg(long)]
        bet: u64,
    },
    /// Reveal the server seed of a played commitment
    Reveal {
        #[arg(long)]
        commitment: String,
    },
    /// Check a claimed outcome against revealed seeds
    Verify {
        #[arg(long)]
        game: String,
        #[arg(long)]
        client_seed: String,
        #[arg(long)]
        server_seed: String,
        #[arg(long)]
        hash: String,
        #[arg(long)]
        round: u64,
        /// Comma-separated symbols, in draw order
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
        /// Claimed multiplier, e.g. "10" or "2.5"
        #[arg(long)]
        multiplier: String,
    },
    /// Print raw RNG stream values
    Derive {
        #[arg(long)]
        server_seed: String,
        #[arg(long)]
        client_seed: String,
        #[arg(long, default_value = "0")]
        round: u64,
        #[arg(long, default_value = "3")]
        count: usize,
        #[arg(long, default_value = "0")]
        min: u64,
        #[arg(long, default_value = "1000000")]
        max: u64,
    },
    /// List playable games
    Games,
    /// Play many verified rounds and report the observed RTP
    Simulate {
        #[arg(long, default_value = "slots")]
        game: String,
        #[arg(long, default_value = "10000")]
        rounds: u64,
        #[arg(long, default_value = "10")]
        bet: u64,
    },
}

fn init_logging(config: &FairspinConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> FairnessResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| fairspin::FairnessError::InvalidInput(format!("unprintable result: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

async fn run(command: Command, config: &FairspinConfig) -> FairnessResult<()> {
    let service: FairnessService = ServiceFactory::create_service(config)?;

    match command {
        Command::Commit { owner } => print_json(&service.commit(&CommitRequest { owner_id: owner })?),
        Command::Play {
            commitment,
            owner,
            game,
            client_seed,
            bet,
        } => print_json(&service.play(&PlayRequest {
            commitment_id: commitment,
            owner_id: owner,
            game_type: game,
            client_seed,
            bet_amount: bet,
        })?),
        Command::Reveal { commitment } => print_json(&service.reveal(&RevealRequest {
            commitment_id: commitment,
        })?),
        Command::Verify {
            game,
            client_seed,
            server_seed,
            hash,
            round,
            symbols,
            multiplier,
        } => {
            let multiplier: Multiplier = multiplier.parse()?;
            let claimed_outcome = GameOutcome::new(symbols, multiplier, 0)?;
            print_json(&service.verify(&VerifyRequest {
                game_type: game,
                client_seed,
                server_seed,
                server_seed_hash: hash,
                round_index: round,
                claimed_outcome,
            }))
        }
        Command::Derive {
            server_seed,
            client_seed,
            round,
            count,
            min,
            max,
        } => print_json(&rng::derive(&server_seed, &client_seed, round, count, min, max)?),
        Command::Games => print_json(&service.games()),
        Command::Simulate { game, rounds, bet } => {
            let game: GameType = game.parse()?;
            let report =
                simulation::simulate(service, game, rounds, bet, config.simulation.concurrency).await?;
            print_json(&report)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    init_logging(&config);
    if config.storage.backend == StorageBackend::Memory
        && matches!(cli.command, Command::Play { .. } | Command::Reveal { .. })
    {
        tracing::warn!("In-memory store: commitments from earlier invocations are not visible");
    }

    if let Err(e) = run(cli.command, &config).await {
        tracing::debug!(error = %e, "Command failed");
        let body = ErrorBody::from(&e);
        match serde_json::to_string_pretty(&body) {
            Ok(rendered) => eprintln!("{}", rendered),
            Err(_) => eprintln!("{}", e),
        }
        std::process::exit(1);
    }
}
