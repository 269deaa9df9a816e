//! fairspin - provably-fair outcome engine
//!
//! Commit-reveal server seeds, an HMAC-SHA256 hash-chain RNG derived from them,
//! and deterministic game resolvers whose results anyone can replay and verify.

pub mod commitment;
pub mod config;
pub mod errors;
pub mod factory;
pub mod games;
pub mod metrics;
pub mod rng;
pub mod service;
pub mod simulation;
pub mod verifier;

pub use commitment::{
    Commitment, CommitmentManager, CommitmentStore, ConsumedSeed, PublicCommitment, RoundRecord, SeedPair,
};
pub use config::{ConfigLoader, FairspinConfig};
pub use errors::{FairnessError, FairnessResult};
pub use factory::ServiceFactory;
pub use games::{Game, GameOutcome, GameType, Multiplier};
pub use rng::{derive, RngStream};
pub use service::{FairnessService, LedgerSink, Settlement};
pub use verifier::{verify, verify_record, VerificationRecord};
