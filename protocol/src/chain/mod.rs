//! # Chain Collaborators
//!
//! The authenticator never talks to the network directly. It consumes three
//! narrow contracts and leaves transport to whoever implements them:
//!
//! ```text
//! ChainHeadOracle  latest height, hash, PoW baseline and chain id
//! ParameterSource  read-only network parameters (string values)
//! Submitter        hands a signed envelope to a node, returns its ack
//! ```
//!
//! [`NetworkParameters`] is an in-memory [`ParameterSource`] suitable for
//! wiring a parameter stream into, and for tests.

pub mod parameters;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

use crate::transaction::types::Transaction;

pub use parameters::{read_f64, NetworkParameters, ParameterError};
pub use types::{ChainHead, HashFunction, SubmitResponse};

/// The oracle could not produce a chain head.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("chain head unavailable: {0}")]
    Unavailable(String),
}

/// Transport-level failure while submitting a transaction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("node unreachable: {0}")]
    Unreachable(String),

    #[error("transport failure: {0}")]
    Failed(String),
}

/// Source of the latest chain head.
#[async_trait]
pub trait ChainHeadOracle: Send + Sync {
    async fn chain_head(&self) -> Result<ChainHead, OracleError>;
}

/// Read-only lookup of network parameters by key.
pub trait ParameterSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Hands signed transactions to a node.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit_transaction(&self, tx: &Transaction) -> Result<SubmitResponse, TransportError>;
}
