// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Transaction Authentication Core
//!
//! Everything a trading client needs to get a transaction accepted by a
//! proof-of-work gated chain: a key per identity, a spam PoW solution per
//! transaction, and a signature binding both to the payload.
//!
//! ## Architecture
//!
//! - **chain**: collaborator contracts (chain head, parameters, submission).
//! - **config**: network constants and runtime tunables.
//! - **crypto**: SHA3-256, leading-zero counting, ed25519 key pairs.
//! - **identity**: BIP-39 + SLIP-10 key vault.
//! - **pow**: the PoW rule and the precomputed candidate inventory.
//! - **transaction**: payloads, envelopes, signing and the authenticator.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use txauth_protocol::chain::{ChainHeadOracle, NetworkParameters, Submitter};
//! # async fn demo(oracle: Arc<dyn ChainHeadOracle>, node: Arc<dyn Submitter>) -> Result<(), Box<dyn std::error::Error>> {
//! use txauth_protocol::config::{AuthenticatorConfig, InventoryConfig};
//! use txauth_protocol::identity::KeyVault;
//! use txauth_protocol::transaction::{Command, InputData, OrderCancellation, TransactionAuthenticator};
//!
//! let vault = Arc::new(KeyVault::from_mnemonic("abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about")?);
//! let party = vault.derive(0)?.public_key_hex();
//!
//! let auth = TransactionAuthenticator::new(
//!     vault,
//!     oracle,
//!     Arc::new(NetworkParameters::new()),
//!     node,
//!     InventoryConfig::default(),
//!     AuthenticatorConfig::default(),
//! );
//! auth.start();
//!
//! let input = InputData::new(Command::OrderCancellation(OrderCancellation::default()));
//! let tx = auth.sign(&party, input).await?;
//! let ack = auth.submit(&tx).await?;
//! println!("{} accepted={}", ack.tx_hash, ack.success);
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod pow;
pub mod transaction;
