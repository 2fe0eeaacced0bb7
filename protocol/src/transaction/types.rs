//! Payload and envelope types.
//!
//! [`InputData`] is what the caller wants the network to do. The
//! authenticator stamps it with a nonce and a block height, serializes it
//! with `bincode` and wraps the bytes in a signed [`Transaction`] envelope.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{SIGNATURE_ALGORITHM, SIGNATURE_VERSION, TX_VERSION};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// How long an order stays on the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    GoodTilCancelled,
    GoodTilTime,
    ImmediateOrCancel,
    FillOrKill,
    GoodForAuction,
    GoodForNormal,
}

/// Order pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
}

/// A new order on one market. Prices and sizes are integer strings in the
/// market's decimal units, as the network expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmission {
    pub market_id: String,
    pub price: String,
    pub size: u64,
    pub side: Side,
    pub time_in_force: TimeInForce,
    pub expires_at: i64,
    pub order_type: OrderType,
    pub reference: String,
    pub post_only: bool,
    pub reduce_only: bool,
}

/// Cancels one order, every order on a market, or every order (both
/// fields empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancellation {
    pub order_id: Option<String>,
    pub market_id: Option<String>,
}

/// Commits liquidity to a market in exchange for fee revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityProvisionSubmission {
    pub market_id: String,
    pub commitment_amount: String,
    pub fee: String,
    pub reference: String,
}

/// Several order operations applied atomically, cancellations first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMarketInstructions {
    pub cancellations: Vec<OrderCancellation>,
    pub submissions: Vec<OrderSubmission>,
}

/// The operation carried by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    OrderSubmission(OrderSubmission),
    OrderCancellation(OrderCancellation),
    LiquidityProvisionSubmission(LiquidityProvisionSubmission),
    BatchMarketInstructions(BatchMarketInstructions),
}

impl Command {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderSubmission(_) => "order_submission",
            Self::OrderCancellation(_) => "order_cancellation",
            Self::LiquidityProvisionSubmission(_) => "liquidity_provision_submission",
            Self::BatchMarketInstructions(_) => "batch_market_instructions",
        }
    }
}

// ---------------------------------------------------------------------------
// InputData
// ---------------------------------------------------------------------------

/// The signed payload.
///
/// `nonce` and `block_height` are overwritten by the authenticator; whatever
/// the caller puts there is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputData {
    pub nonce: u64,
    pub block_height: u64,
    pub command: Command,
}

impl InputData {
    /// Wraps a command with zeroed nonce and height.
    pub fn new(command: Command) -> Self {
        Self {
            nonce: 0,
            block_height: 0,
            command,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Envelope format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum TxVersion {
    V3,
}

impl From<TxVersion> for u32 {
    fn from(version: TxVersion) -> Self {
        match version {
            TxVersion::V3 => TX_VERSION,
        }
    }
}

impl TryFrom<u32> for TxVersion {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            TX_VERSION => Ok(TxVersion::V3),
            other => Err(format!("unsupported transaction version {}", other)),
        }
    }
}

impl fmt::Display for TxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", u32::from(*self))
    }
}

/// Signature block of the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Lowercase hex of the 64-byte ed25519 signature.
    pub value: String,
    pub algo: String,
    pub version: u32,
}

impl Signature {
    /// An ed25519 signature block for `value`.
    pub fn ed25519(value: String) -> Self {
        Self {
            value,
            algo: SIGNATURE_ALGORITHM.to_string(),
            version: SIGNATURE_VERSION,
        }
    }
}

/// PoW block of the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfWork {
    /// Transaction id the PoW was computed for.
    pub tid: String,
    pub nonce: u64,
}

/// A signed, PoW-stamped transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: TxVersion,
    pub signature: Signature,
    pub pow: ProofOfWork,
    /// `bincode(InputData)`, exactly the bytes that were signed (after the
    /// chain id prefix).
    pub input_data: Vec<u8>,
    /// Lowercase hex public key of the signer.
    pub pub_key: String,
}

impl Transaction {
    /// Decodes the embedded payload.
    pub fn decode_input_data(&self) -> Result<InputData, bincode::Error> {
        bincode::deserialize(&self.input_data)
    }
}
