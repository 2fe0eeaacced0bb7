//! # Transaction Authenticator
//!
//! Turns a caller's [`InputData`] into a signed, PoW-stamped
//! [`Transaction`] and hands finished transactions to a node.
//!
//! ## Signing pipeline
//!
//! 1. Read the chain head. No head, no transaction.
//! 2. Stamp a random nonce and, tentatively, the head height.
//! 3. Resolve the identity (public key hex) to an already-derived key.
//! 4. Claim a PoW candidate, waiting for the inventory if it is empty.
//! 5. Re-stamp the height with the candidate's height. The network checks
//!    the PoW against the block the payload names, so the two must agree.
//! 6. Serialize, prefix with the chain id, SHA3-256, ed25519.
//! 7. Assemble the v3 envelope.
//!
//! The PoW wait never holds the inventory lock; each attempt takes and
//! releases it. The wait is bounded by [`AuthenticatorConfig::max_pow_wait`]
//! and is cancelled by dropping the returned future.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::signing::{encode_input_data, sign_input_data};
use super::types::{InputData, ProofOfWork, Signature, Transaction, TxVersion};
use crate::chain::{
    ChainHeadOracle, OracleError, ParameterSource, SubmitResponse, Submitter, TransportError,
};
use crate::config::{AuthenticatorConfig, InventoryConfig};
use crate::crypto::keys::{KeyError, KeyPair};
use crate::identity::KeyVault;
use crate::pow::{PowCandidate, ProofOfWorkInventory};

/// Why a transaction could not be signed or submitted.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No chain head. Transient; retry later.
    #[error("chain head unavailable: {0}")]
    OracleUnavailable(#[from] OracleError),

    /// The identity was never derived by the vault.
    #[error("unknown identity {0}")]
    UnknownIdentity(String),

    /// No PoW candidate became available within the configured wait.
    #[error("no proof of work available after {0:?}")]
    ProofOfWorkTimeout(Duration),

    /// The payload could not be serialized.
    #[error("cannot serialize input data: {0}")]
    Serialization(#[from] bincode::Error),

    /// The stored private key could not be used.
    #[error("cannot sign: {0}")]
    Signing(#[from] KeyError),

    /// The node could not be reached or failed at transport level.
    #[error("submission failed: {0}")]
    SubmitFailed(#[from] TransportError),
}

/// Signs and submits transactions on behalf of vault identities.
pub struct TransactionAuthenticator {
    vault: Arc<KeyVault>,
    oracle: Arc<dyn ChainHeadOracle>,
    submitter: Arc<dyn Submitter>,
    inventory: Arc<ProofOfWorkInventory>,
    config: AuthenticatorConfig,
}

impl TransactionAuthenticator {
    /// Wires the authenticator and its inventory. Call [`start`] to begin
    /// precomputing PoW.
    ///
    /// [`start`]: TransactionAuthenticator::start
    pub fn new(
        vault: Arc<KeyVault>,
        oracle: Arc<dyn ChainHeadOracle>,
        params: Arc<dyn ParameterSource>,
        submitter: Arc<dyn Submitter>,
        inventory_config: InventoryConfig,
        config: AuthenticatorConfig,
    ) -> Self {
        let inventory = Arc::new(ProofOfWorkInventory::new(
            Arc::clone(&oracle),
            params,
            inventory_config,
        ));
        Self {
            vault,
            oracle,
            submitter,
            inventory,
            config,
        }
    }

    /// Starts the inventory's refill and expiry tasks. Returns `false` if
    /// they were already running.
    pub fn start(&self) -> bool {
        self.inventory.start()
    }

    /// Stops the inventory's background tasks.
    pub async fn stop(&self) {
        self.inventory.stop().await;
    }

    /// The key vault. Derive every identity you intend to sign for up front;
    /// [`sign`](Self::sign) only finds keys that were already derived.
    pub fn vault(&self) -> &Arc<KeyVault> {
        &self.vault
    }

    pub fn inventory(&self) -> &Arc<ProofOfWorkInventory> {
        &self.inventory
    }

    /// True if at least one unused PoW candidate is available.
    pub fn has_pending_proof_of_work(&self) -> bool {
        self.inventory.has_unused()
    }

    /// Signs `input` as `identity` using the configured PoW wait bound.
    pub async fn sign(&self, identity: &str, input: InputData) -> Result<Transaction, AuthError> {
        self.sign_with_timeout(identity, input, self.config.max_pow_wait)
            .await
    }

    /// Signs `input` as `identity`, waiting at most `max_wait` for PoW
    /// (`None` waits until a candidate appears).
    pub async fn sign_with_timeout(
        &self,
        identity: &str,
        mut input: InputData,
        max_wait: Option<Duration>,
    ) -> Result<Transaction, AuthError> {
        let head = self.oracle.chain_head().await?;

        input.nonce = rand::thread_rng().gen();
        input.block_height = head.height;

        let key = self
            .vault
            .lookup_by_public_key(identity)
            .ok_or_else(|| AuthError::UnknownIdentity(identity.to_string()))?;

        let candidate = self.claim_pow(max_wait).await?;
        if candidate.block_height != head.height {
            debug!(
                head_height = head.height,
                pow_height = candidate.block_height,
                "stamping payload with PoW height"
            );
        }
        input.block_height = candidate.block_height;

        let input_data = encode_input_data(&input)?;
        let signer = KeyPair::from_private_key_hex(&key.private_key_hex())?;
        let signature = sign_input_data(&signer, &head.chain_id, &input_data);

        debug!(
            identity = %key.public_key_hex(),
            command = input.command.kind(),
            height = candidate.block_height,
            difficulty = candidate.difficulty,
            tid = %candidate.tx_id,
            "signed transaction"
        );

        Ok(Transaction {
            version: TxVersion::V3,
            signature: Signature::ed25519(hex::encode(signature.to_bytes())),
            pow: ProofOfWork {
                tid: candidate.tx_id,
                nonce: candidate.nonce,
            },
            input_data,
            pub_key: key.public_key_hex(),
        })
    }

    /// Hands `tx` to the node.
    ///
    /// A node answer with `success == false` is logged and returned as-is;
    /// only transport failures are errors.
    pub async fn submit(&self, tx: &Transaction) -> Result<SubmitResponse, AuthError> {
        match self.submitter.submit_transaction(tx).await {
            Ok(response) => {
                if !response.success {
                    warn!(
                        tx_hash = %response.tx_hash,
                        code = response.code,
                        data = %response.data,
                        "transaction rejected by node"
                    );
                }
                Ok(response)
            }
            Err(e) => {
                error!(error = %e, pub_key = %tx.pub_key, "cannot submit transaction");
                Err(AuthError::SubmitFailed(e))
            }
        }
    }

    async fn claim_pow(&self, max_wait: Option<Duration>) -> Result<PowCandidate, AuthError> {
        if let Some(candidate) = self.inventory.acquire() {
            return Ok(candidate);
        }
        debug!("no PoW available, waiting for refill");

        let wait = self.inventory.wait_for_candidate(self.config.poll_interval);
        match max_wait {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| AuthError::ProofOfWorkTimeout(limit)),
            None => Ok(wait.await),
        }
    }
}

impl std::fmt::Debug for TransactionAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionAuthenticator")
            .field("vault", &self.vault)
            .field("inventory", &self.inventory)
            .field("config", &self.config)
            .finish()
    }
}
