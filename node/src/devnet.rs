//! # Simulated Chain
//!
//! A single-process stand-in for a PoW gated network, used by the `devnet`
//! subcommand.
//!
//! - [`DevnetChain`] is the chain head oracle. Height advances with wall
//!   time, one block per `block_time`; block hashes are uppercase hex
//!   `SHA-256(chain_id || height)`, the way real nodes report them.
//! - [`DevnetNode`] is the submitter. It verifies every envelope like a
//!   validator (signature, PoW against the claimed block, block age, tid
//!   replay) and answers with `success = false` and a code on rejection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::debug;

use txauth_protocol::chain::{
    ChainHead, ChainHeadOracle, HashFunction, OracleError, SubmitResponse, Submitter,
    TransportError,
};
use txauth_protocol::transaction::{verify_transaction, verify_transaction_pow, Transaction};

/// Rejection codes returned by [`DevnetNode`].
pub mod codes {
    pub const OK: u32 = 0;
    pub const UNDECODABLE: u32 = 10;
    pub const BAD_SIGNATURE: u32 = 60;
    pub const STALE_BLOCK: u32 = 70;
    pub const BAD_POW: u32 = 80;
    pub const REPLAYED_POW: u32 = 89;
}

/// Chain head oracle whose height follows the clock.
#[derive(Debug)]
pub struct DevnetChain {
    chain_id: String,
    block_time: Duration,
    difficulty: u32,
    genesis: Instant,
}

impl DevnetChain {
    pub fn new(chain_id: impl Into<String>, block_time: Duration, difficulty: u32) -> Self {
        Self {
            chain_id: chain_id.into(),
            block_time: block_time.max(Duration::from_millis(1)),
            difficulty,
            genesis: Instant::now(),
        }
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Current height. Genesis is height 1.
    pub fn height(&self) -> u64 {
        let elapsed = self.genesis.elapsed().as_millis();
        let blocks = elapsed / self.block_time.as_millis();
        1 + u64::try_from(blocks).unwrap_or(u64::MAX - 1)
    }

    /// Head of the block at `height`, which need not be the latest.
    pub fn head_at(&self, height: u64) -> ChainHead {
        let mut hasher = Sha256::new();
        hasher.update(self.chain_id.as_bytes());
        hasher.update(height.to_be_bytes());
        ChainHead {
            height,
            hash: hex::encode_upper(hasher.finalize()),
            spam_pow_difficulty: self.difficulty,
            hash_function: HashFunction::Sha3_24Rounds,
            chain_id: self.chain_id.clone(),
        }
    }
}

#[async_trait]
impl ChainHeadOracle for DevnetChain {
    async fn chain_head(&self) -> Result<ChainHead, OracleError> {
        Ok(self.head_at(self.height()))
    }
}

/// Running totals of the simulated node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DevnetStats {
    pub accepted: u64,
    pub rejected: u64,
}

/// Submitter that validates envelopes against a [`DevnetChain`].
pub struct DevnetNode {
    chain: std::sync::Arc<DevnetChain>,
    past_blocks: u64,
    seen_tids: Mutex<HashSet<String>>,
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl DevnetNode {
    /// `past_blocks` is how old a PoW block may be before it is stale.
    pub fn new(chain: std::sync::Arc<DevnetChain>, past_blocks: u64) -> Self {
        Self {
            chain,
            past_blocks,
            seen_tids: Mutex::new(HashSet::new()),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> DevnetStats {
        DevnetStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    fn check(&self, tx: &Transaction) -> Result<(), (u32, String)> {
        let payload = tx
            .decode_input_data()
            .map_err(|e| (codes::UNDECODABLE, e.to_string()))?;

        verify_transaction(tx, self.chain.chain_id())
            .map_err(|e| (codes::BAD_SIGNATURE, e.to_string()))?;

        let tip = self.chain.height();
        if payload.block_height > tip || tip - payload.block_height > self.past_blocks {
            return Err((
                codes::STALE_BLOCK,
                format!("block {} outside window at tip {}", payload.block_height, tip),
            ));
        }

        let head = self.chain.head_at(payload.block_height);
        verify_transaction_pow(tx, &head, self.chain.difficulty())
            .map_err(|e| (codes::BAD_POW, e.to_string()))?;

        if !self.seen_tids.lock().insert(tx.pow.tid.clone()) {
            return Err((codes::REPLAYED_POW, format!("tid {} already used", tx.pow.tid)));
        }
        Ok(())
    }
}

#[async_trait]
impl Submitter for DevnetNode {
    async fn submit_transaction(&self, tx: &Transaction) -> Result<SubmitResponse, TransportError> {
        let mut hasher = Sha256::new();
        hasher.update(&tx.input_data);
        let tx_hash = hex::encode_upper(hasher.finalize());

        let response = match self.check(tx) {
            Ok(()) => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
                SubmitResponse {
                    success: true,
                    tx_hash,
                    code: codes::OK,
                    data: String::new(),
                }
            }
            Err((code, data)) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                SubmitResponse {
                    success: false,
                    tx_hash,
                    code,
                    data,
                }
            }
        };
        debug!(
            tx_hash = %response.tx_hash,
            success = response.success,
            code = response.code,
            "devnet node processed transaction"
        );
        Ok(response)
    }
}
