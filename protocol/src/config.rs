//! # Protocol Configuration & Constants
//!
//! Every magic number the authenticator depends on lives here, next to the
//! two runtime tunable structs ([`InventoryConfig`] and
//! [`AuthenticatorConfig`]). Values that the target network dictates (PoW
//! prefix, transaction version, signature tag) must not be changed without a
//! matching network upgrade.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Network Parameter Keys
// ---------------------------------------------------------------------------

/// How many past blocks a PoW solution stays valid for. The inventory keeps
/// buckets for the most recent 80% of that window.
pub const NUMBER_OF_PAST_BLOCKS_KEY: &str = "spam.pow.numberOfPastBlocks";

/// How many transactions a single key may submit per block before the
/// network demands an extra leading zero.
pub const TX_PER_BLOCK_KEY: &str = "spam.pow.numberOfTxPerBlock";

// ---------------------------------------------------------------------------
// Proof-of-Work
// ---------------------------------------------------------------------------

/// Number of candidates computed for each new block height.
pub const POW_BATCH_SIZE: usize = 10;

/// Fraction of `numberOfPastBlocks` a bucket may age before it is dropped.
pub const POW_RETENTION_FACTOR: f64 = 0.8;

/// Domain separator prepended to every PoW preimage.
pub const POW_SPAM_PREFIX: &str = "Vega_SPAM_PoW";

/// Digest length is 256 bits, so no difficulty above this is satisfiable.
pub const MAX_POW_DIFFICULTY: u32 = 256;

/// Length of a hex-encoded block hash as reported by the node.
pub const BLOCK_HASH_HEX_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Transaction Envelope
// ---------------------------------------------------------------------------

/// Envelope version understood by the network.
pub const TX_VERSION: u32 = 3;

/// Algorithm tag carried in the envelope signature.
pub const SIGNATURE_ALGORITHM: &str = "ed25519";

/// Version of the signature scheme.
pub const SIGNATURE_VERSION: u32 = 1;

/// Separator between the chain id and the serialized input data in the
/// signing bytes.
pub const CHAIN_ID_DELIMITER: u8 = 0x00;

// ---------------------------------------------------------------------------
// Key Derivation
// ---------------------------------------------------------------------------

/// SLIP-10 purpose segment of the derivation path `m/1789'/0'/{index}'`.
pub const DERIVATION_PURPOSE: u32 = 1789;

/// Account segment of the derivation path.
pub const DERIVATION_ACCOUNT: u32 = 0;

/// Highest derivation index the vault will derive. The cache is an arena
/// indexed by derivation index, so this bounds its size.
pub const MAX_DERIVATION_INDEX: u32 = 65_535;

/// Builds the derivation path for the key at `index`.
pub fn derivation_path(index: u32) -> String {
    format!("m/{}'/{}'/{}'", DERIVATION_PURPOSE, DERIVATION_ACCOUNT, index)
}

// ---------------------------------------------------------------------------
// Timing Constants
// ---------------------------------------------------------------------------

/// Cadence of the refill task.
pub const REFILL_INTERVAL: Duration = Duration::from_secs(1);

/// Cadence of the expiry task.
pub const EXPIRE_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound between two inventory checks while `sign` waits for a
/// candidate. Insertions wake waiters immediately; this only caps the gap.
pub const POW_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default ceiling on how long `sign` waits for a candidate.
pub const DEFAULT_MAX_POW_WAIT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Runtime Tunables
// ---------------------------------------------------------------------------

/// Knobs for the PoW inventory and its maintenance tasks.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// Candidates computed per new block height.
    pub batch_size: usize,

    /// Time between two refill ticks.
    pub refill_interval: Duration,

    /// Time between two expiry ticks.
    pub expire_interval: Duration,

    /// Multiplier applied to `numberOfPastBlocks` when computing the retain
    /// floor.
    pub retention_factor: f64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            batch_size: POW_BATCH_SIZE,
            refill_interval: REFILL_INTERVAL,
            expire_interval: EXPIRE_INTERVAL,
            retention_factor: POW_RETENTION_FACTOR,
        }
    }
}

/// Knobs for the transaction authenticator.
#[derive(Debug, Clone)]
pub struct AuthenticatorConfig {
    /// Maximum gap between two inventory polls while waiting for PoW.
    pub poll_interval: Duration,

    /// How long `sign` waits for a candidate before giving up. `None` waits
    /// forever.
    pub max_pow_wait: Option<Duration>,
}

impl Default for AuthenticatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: POW_POLL_INTERVAL,
            max_pow_wait: Some(DEFAULT_MAX_POW_WAIT),
        }
    }
}
