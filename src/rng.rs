//! Deterministic random-number stream
//!
//! A keyed HMAC-SHA256 hash chain. The first digest is taken over
//! `client_seed || round_index (u64, big-endian)` with the server seed as key;
//! every following digest re-keys the same HMAC over the previous 32-byte
//! digest. Digests are read as 256-bit big-endian integers and reduced into
//! `[min_val, max_val)` with an exact modulo.
//!
//! Nothing here holds hidden state: the stream is a pure function of its inputs
//! so any third party can re-derive it.

use crate::errors::{FairnessError, FairnessResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Size of one chain link in bytes
pub const DIGEST_LEN: usize = 32;

/// Lazy iterator over the raw digests of the hash chain
#[derive(Clone)]
pub struct RngStream {
    key: Vec<u8>,
    previous: Option<[u8; DIGEST_LEN]>,
    first_message: Vec<u8>,
}

impl RngStream {
    /// Start a new stream. Both seeds must be non-empty.
    pub fn new(server_seed: &str, client_seed: &str, round_index: u64) -> FairnessResult<Self> {
        if server_seed.is_empty() {
            return Err(FairnessError::InvalidInput("server seed must not be empty".to_string()));
        }
        if client_seed.is_empty() {
            return Err(FairnessError::InvalidInput("client seed must not be empty".to_string()));
        }

        let mut first_message = Vec::with_capacity(client_seed.len() + 8);
        first_message.extend_from_slice(client_seed.as_bytes());
        first_message.extend_from_slice(&round_index.to_be_bytes());

        Ok(Self {
            key: server_seed.as_bytes().to_vec(),
            previous: None,
            first_message,
        })
    }

    /// Next value reduced into `[min_val, max_val)`
    pub fn next_in_range(&mut self, min_val: u64, max_val: u64) -> FairnessResult<u64> {
        check_range(min_val, max_val)?;
        let digest = self.next_digest();
        Ok(min_val + reduce_be(&digest, max_val - min_val))
    }

    fn next_digest(&mut self) -> [u8; DIGEST_LEN] {
        let digest = match &self.previous {
            None => keyed_digest(&self.key, &self.first_message),
            Some(prev) => keyed_digest(&self.key, prev),
        };
        self.previous = Some(digest);
        digest
    }
}

impl Iterator for RngStream {
    type Item = [u8; DIGEST_LEN];

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_digest())
    }
}

/// Derive `count` integers in `[min_val, max_val)` from the seed triple.
pub fn derive(
    server_seed: &str,
    client_seed: &str,
    round_index: u64,
    count: usize,
    min_val: u64,
    max_val: u64,
) -> FairnessResult<Vec<u64>> {
    if count < 1 {
        return Err(FairnessError::InvalidInput("count must be at least 1".to_string()));
    }
    check_range(min_val, max_val)?;

    let mut stream = RngStream::new(server_seed, client_seed, round_index)?;
    (0..count)
        .map(|_| stream.next_in_range(min_val, max_val))
        .collect()
}

fn check_range(min_val: u64, max_val: u64) -> FairnessResult<()> {
    if max_val <= min_val {
        return Err(FairnessError::InvalidInput(format!(
            "max_val ({}) must be greater than min_val ({})",
            max_val, min_val
        )));
    }
    Ok(())
}

fn keyed_digest(key: &[u8], message: &[u8]) -> [u8; DIGEST_LEN] {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
    };
    mac.update(message);

    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// `value mod modulus` where `value` is a big-endian unsigned integer of any width
fn reduce_be(bytes: &[u8], modulus: u64) -> u64 {
    let m = modulus as u128;
    let rem = bytes
        .iter()
        .fold(0u128, |acc, &byte| ((acc << 8) | byte as u128) % m);
    rem as u64
}
