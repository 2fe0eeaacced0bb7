//! # Spam PoW Rule
//!
//! The network accepts a transaction only if it carries a nonce such that
//!
//! ```text
//! H("Vega_SPAM_PoW" || block_hash || tx_id || nonce_be64)
//! ```
//!
//! has at least `difficulty` leading zero bits, where `H` is the hash
//! function named by the chain head and `block_hash` / `tx_id` are taken as
//! their ASCII bytes.
//!
//! [`solve`] searches nonces from zero upward. It is CPU-bound and blocking;
//! async callers must run it on a blocking thread.

use crate::chain::HashFunction;
use crate::config::{BLOCK_HASH_HEX_LENGTH, MAX_POW_DIFFICULTY, POW_SPAM_PREFIX};
use crate::crypto::hash::{leading_zero_bits, sha3_256};

use super::PowError;

/// A nonce that satisfies the PoW rule, with the digest it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowSolution {
    pub nonce: u64,
    pub hash: [u8; 32],
}

/// Builds the PoW preimage for one nonce.
pub fn pow_preimage(block_hash: &str, tx_id: &str, nonce: u64) -> Vec<u8> {
    let mut data =
        Vec::with_capacity(POW_SPAM_PREFIX.len() + block_hash.len() + tx_id.len() + 8);
    data.extend_from_slice(POW_SPAM_PREFIX.as_bytes());
    data.extend_from_slice(block_hash.as_bytes());
    data.extend_from_slice(tx_id.as_bytes());
    data.extend_from_slice(&nonce.to_be_bytes());
    data
}

/// Hashes the preimage for `nonce` with `hash_function`.
pub fn pow_hash(hash_function: HashFunction, block_hash: &str, tx_id: &str, nonce: u64) -> [u8; 32] {
    let data = pow_preimage(block_hash, tx_id, nonce);
    match hash_function {
        HashFunction::Sha3_24Rounds => sha3_256(&data),
    }
}

fn validate(block_hash: &str, tx_id: &str, difficulty: u32) -> Result<(), PowError> {
    if difficulty > MAX_POW_DIFFICULTY {
        return Err(PowError::DifficultyTooHigh(difficulty));
    }
    if tx_id.is_empty() {
        return Err(PowError::EmptyTxId);
    }
    if block_hash.len() != BLOCK_HASH_HEX_LENGTH
        || !block_hash.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(PowError::InvalidBlockHash(block_hash.to_string()));
    }
    Ok(())
}

/// Finds the smallest nonce meeting `difficulty` for `(block_hash, tx_id)`.
pub fn solve(
    block_hash: &str,
    tx_id: &str,
    difficulty: u32,
    hash_function: HashFunction,
) -> Result<PowSolution, PowError> {
    validate(block_hash, tx_id, difficulty)?;

    let mut nonce = 0u64;
    loop {
        let hash = pow_hash(hash_function, block_hash, tx_id, nonce);
        if leading_zero_bits(&hash) >= difficulty {
            return Ok(PowSolution { nonce, hash });
        }
        nonce = nonce.checked_add(1).ok_or(PowError::Exhausted)?;
    }
}

/// Checks that `nonce` meets `difficulty` for `(block_hash, tx_id)`.
pub fn verify_pow(
    block_hash: &str,
    tx_id: &str,
    nonce: u64,
    difficulty: u32,
    hash_function: HashFunction,
) -> Result<bool, PowError> {
    validate(block_hash, tx_id, difficulty)?;
    let hash = pow_hash(hash_function, block_hash, tx_id, nonce);
    Ok(leading_zero_bits(&hash) >= difficulty)
}
