//! # Transaction Module
//!
//! Payload types, signing, verification and the authenticator that ties
//! the PoW inventory and the key vault together.
//!
//! ```text
//! types.rs         InputData, Command and the Transaction envelope
//! signing.rs       canonical signing bytes and the ed25519 signature
//! verification.rs  what a receiving node checks
//! authenticator.rs claim PoW, stamp, sign, submit
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: the caller wraps a [`Command`] in [`InputData`].
//! 2. **Sign**: [`TransactionAuthenticator::sign`] stamps nonce and height,
//!    attaches a PoW and signs.
//! 3. **Submit**: [`TransactionAuthenticator::submit`] hands the envelope to
//!    a node and returns its answer.
//! 4. **Verify**: nodes run [`verify_transaction`] and
//!    [`verify_transaction_pow`] before inclusion.

pub mod authenticator;
pub mod signing;
pub mod types;
pub mod verification;

pub use authenticator::{AuthError, TransactionAuthenticator};
pub use signing::{encode_input_data, sign_input_data, signing_bytes, signing_digest};
pub use types::{
    BatchMarketInstructions, Command, InputData, LiquidityProvisionSubmission, OrderCancellation,
    OrderSubmission, OrderType, ProofOfWork, Side, Signature, TimeInForce, Transaction, TxVersion,
};
pub use verification::{verify_transaction, verify_transaction_pow, VerificationError};
