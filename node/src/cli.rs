//! # CLI Interface
//!
//! Command-line structure for `txauth-node`, built with `clap` derive.
//! Four subcommands: `keys`, `solve`, `devnet` and `version`.
//!
//! The recovery phrase is read from `TXAUTH_MNEMONIC` when not passed on the
//! command line, which keeps it out of shell history.

use clap::{Args, Parser, Subcommand};

/// Transaction authenticator for proof-of-work gated chains.
///
/// Derives signing identities from a recovery phrase, solves spam PoW and
/// runs a self-contained devnet that exercises the whole signing pipeline.
#[derive(Parser, Debug)]
#[command(
    name = "txauth-node",
    about = "Transaction authenticator for proof-of-work gated chains",
    version,
    propagate_version = true
)]
pub struct TxAuthCli {
    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "TXAUTH_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Default log filter, overridden by `RUST_LOG`.
    #[arg(
        long,
        global = true,
        env = "TXAUTH_LOG_LEVEL",
        default_value = "txauth_node=info,txauth_protocol=info"
    )]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive and print the first N identities of a recovery phrase.
    Keys(KeysArgs),
    /// Run one PoW search and print the nonce.
    Solve(SolveArgs),
    /// Run a simulated chain and sign a heartbeat transaction against it
    /// until interrupted.
    Devnet(DevnetArgs),
    /// Print version information and exit.
    Version,
}

/// Recovery phrase shared by the subcommands that derive keys.
#[derive(Args, Debug)]
pub struct MnemonicArg {
    /// BIP-39 recovery phrase.
    #[arg(long, env = "TXAUTH_MNEMONIC", hide_env_values = true)]
    pub mnemonic: String,
}

/// Arguments for the `keys` subcommand.
#[derive(Parser, Debug)]
pub struct KeysArgs {
    #[command(flatten)]
    pub mnemonic: MnemonicArg,

    /// Number of identities to derive, starting at index 0.
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: u32,

    /// Print one JSON object per line instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `solve` subcommand.
#[derive(Parser, Debug)]
pub struct SolveArgs {
    /// Block hash as reported by the node (64 hex characters).
    #[arg(long)]
    pub block_hash: String,

    /// Transaction id to bind the PoW to. A random UUID when omitted.
    #[arg(long)]
    pub tx_id: Option<String>,

    /// Required leading zero bits.
    #[arg(long, short = 'd')]
    pub difficulty: u32,

    /// Hash function name as the node reports it.
    #[arg(long, default_value = "sha3_24_rounds")]
    pub hash_function: String,
}

/// Arguments for the `devnet` subcommand.
#[derive(Parser, Debug)]
pub struct DevnetArgs {
    #[command(flatten)]
    pub mnemonic: MnemonicArg,

    /// Chain id of the simulated network.
    #[arg(long, env = "TXAUTH_CHAIN_ID", default_value = "txauth-devnet")]
    pub chain_id: String,

    /// Time between simulated blocks, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub block_time_ms: u64,

    /// Base spam PoW difficulty of every simulated block.
    #[arg(long, default_value_t = 8)]
    pub difficulty: u32,

    /// Value of `spam.pow.numberOfTxPerBlock`.
    #[arg(long, default_value = "2")]
    pub tx_per_block: String,

    /// Value of `spam.pow.numberOfPastBlocks`.
    #[arg(long, default_value = "10")]
    pub past_blocks: String,

    /// Time between two heartbeat transactions, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pub heartbeat_ms: u64,

    /// Derivation index of the identity that signs the heartbeats.
    #[arg(long, default_value_t = 0)]
    pub key_index: u32,

    /// Seconds `sign` may wait for PoW; 0 waits forever.
    #[arg(long, default_value_t = 30)]
    pub max_pow_wait_secs: u64,
}
