//! # Proof-of-Work Module
//!
//! Keeps a standing supply of spam-PoW solutions so that signing never
//! waits on a hash search.
//!
//! ```text
//! solver.rs     the network's PoW rule: preimage, search, verification
//! inventory.rs  height-bucketed pool of precomputed candidates
//! scheduler.rs  the two periodic maintenance tasks (refill, expire)
//! ```
//!
//! ## Bucket lifecycle
//!
//! ```text
//! EMPTY -> FILLING -> FILLED(n unused) -> ... -> DEPLETED(0 unused)
//!                          \                         /
//!                           +------> EXPIRED <------+
//! ```
//!
//! A bucket is filled once per height, in one batch. Candidates are flagged
//! as used on acquisition, never removed individually. Whole buckets are
//! dropped when they fall out of the retention window.

pub mod inventory;
pub mod scheduler;
pub mod solver;

use thiserror::Error;

pub use inventory::{
    compute_batch, difficulty_for_position, retain_floor, ExpireOutcome, InventoryStats,
    PowCandidate, ProofOfWorkInventory, RefillOutcome,
};
pub use scheduler::SchedulerHandle;
pub use solver::{pow_hash, pow_preimage, solve, verify_pow, PowSolution};

/// Errors raised while computing or checking PoW.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PowError {
    #[error("unsupported PoW hash function '{0}'")]
    UnsupportedHashFunction(String),

    #[error("difficulty {0} exceeds the 256-bit digest")]
    DifficultyTooHigh(u32),

    #[error("transaction id must not be empty")]
    EmptyTxId,

    #[error("block hash '{0}' is not 64 hex characters")]
    InvalidBlockHash(String),

    #[error("nonce space exhausted without a solution")]
    Exhausted,

    #[error("PoW worker failed: {0}")]
    Worker(String),
}
