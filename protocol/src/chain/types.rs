//! Value types exchanged with the chain collaborators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pow::PowError;

/// Hash functions the network may require for spam PoW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashFunction {
    /// SHA3-256 (Keccak-f with 24 rounds).
    #[serde(rename = "sha3_24_rounds")]
    Sha3_24Rounds,
}

impl HashFunction {
    /// Name of the function as the node reports it.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashFunction::Sha3_24Rounds => "sha3_24_rounds",
        }
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashFunction {
    type Err = PowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha3_24_rounds" => Ok(HashFunction::Sha3_24Rounds),
            other => Err(PowError::UnsupportedHashFunction(other.to_string())),
        }
    }
}

/// Snapshot of the latest block as reported by a node.
///
/// Transient: read, used and dropped. Nothing in the crate stores one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHead {
    /// Latest block height.
    pub height: u64,

    /// Block hash, hex-encoded exactly as the node reports it. The PoW
    /// preimage uses these ASCII bytes, so the case must not be changed.
    pub hash: String,

    /// Baseline spam PoW difficulty for this block.
    pub spam_pow_difficulty: u32,

    /// Hash function the PoW must use.
    pub hash_function: HashFunction,

    /// Chain identifier, prefixed to the signing bytes.
    pub chain_id: String,
}

/// A node's answer to a transaction submission.
///
/// `success == false` is a business rejection, not a transport error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub tx_hash: String,
    pub code: u32,
    pub data: String,
}
