//! Envelope verification, as a receiving node performs it.
//!
//! The authenticator never needs this to sign; it exists so that tests and
//! the simulated devnet node can prove that what was signed is what a
//! validator accepts. Checks run cheapest first.

use thiserror::Error;

use super::signing::signing_digest;
use super::types::Transaction;
use crate::chain::ChainHead;
use crate::config::{SIGNATURE_ALGORITHM, SIGNATURE_VERSION};
use crate::crypto::keys::{verify_hex, KeyError};
use crate::pow::{verify_pow, PowError};

/// Why an envelope was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("unsupported signature algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("unsupported signature version {0}")]
    UnsupportedSignatureVersion(u32),

    #[error("input data is empty")]
    EmptyInputData,

    #[error("signature check failed: {0}")]
    Signature(#[from] KeyError),

    #[error("PoW check failed: {0}")]
    Pow(#[from] PowError),

    #[error("PoW nonce {nonce} does not meet difficulty {difficulty}")]
    InsufficientPow { nonce: u64, difficulty: u32 },
}

/// Checks the envelope tags and the ed25519 signature for `chain_id`.
pub fn verify_transaction(tx: &Transaction, chain_id: &str) -> Result<(), VerificationError> {
    if tx.signature.algo != SIGNATURE_ALGORITHM {
        return Err(VerificationError::UnsupportedAlgorithm(
            tx.signature.algo.clone(),
        ));
    }
    if tx.signature.version != SIGNATURE_VERSION {
        return Err(VerificationError::UnsupportedSignatureVersion(
            tx.signature.version,
        ));
    }
    if tx.input_data.is_empty() {
        return Err(VerificationError::EmptyInputData);
    }

    let digest = signing_digest(chain_id, &tx.input_data);
    verify_hex(&tx.pub_key, &digest, &tx.signature.value)?;
    Ok(())
}

/// Checks the envelope's PoW against the block it claims.
///
/// `head` must describe the block at the height embedded in the payload;
/// `difficulty` is what the network demands of this transaction.
pub fn verify_transaction_pow(
    tx: &Transaction,
    head: &ChainHead,
    difficulty: u32,
) -> Result<(), VerificationError> {
    let ok = verify_pow(
        &head.hash,
        &tx.pow.tid,
        tx.pow.nonce,
        difficulty,
        head.hash_function,
    )?;
    if !ok {
        return Err(VerificationError::InsufficientPow {
            nonce: tx.pow.nonce,
            difficulty,
        });
    }
    Ok(())
}
