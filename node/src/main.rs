// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Transaction Authenticator Node
//!
//! Entry point for the `txauth-node` binary. Parses CLI arguments,
//! initializes logging and dispatches to a subcommand:
//!
//! - `keys`    derive and print identities of a recovery phrase
//! - `solve`   run one spam PoW search
//! - `devnet`  sign and submit heartbeats against a simulated chain
//! - `version` print build version information

mod cli;
mod devnet;
mod logging;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::signal;

use txauth_protocol::chain::{ChainHeadOracle, HashFunction, NetworkParameters, Submitter};
use txauth_protocol::config::{
    derivation_path, AuthenticatorConfig, InventoryConfig, NUMBER_OF_PAST_BLOCKS_KEY,
    TX_PER_BLOCK_KEY, TX_VERSION,
};
use txauth_protocol::identity::KeyVault;
use txauth_protocol::pow::solve;
use txauth_protocol::transaction::{
    AuthError, Command, InputData, OrderCancellation, TransactionAuthenticator,
};

use cli::{Commands, TxAuthCli};
use devnet::{DevnetChain, DevnetNode};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TxAuthCli::parse();
    logging::init_logging(&cli.log_level, LogFormat::from_str_lossy(&cli.log_format));

    match cli.command {
        Commands::Keys(args) => list_keys(args),
        Commands::Solve(args) => solve_once(args).await,
        Commands::Devnet(args) => run_devnet(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct KeyReport<'a> {
    index: u32,
    path: &'a str,
    public_key: &'a str,
}

/// Derives the first `count` identities and prints them.
fn list_keys(args: cli::KeysArgs) -> Result<()> {
    let vault =
        KeyVault::from_mnemonic(&args.mnemonic.mnemonic).context("cannot open key vault")?;

    for index in 0..args.count {
        let key = vault
            .derive(index)
            .with_context(|| format!("cannot derive key {}", index))?;
        let path = derivation_path(index);
        let public_key = key.public_key_hex();

        if args.json {
            let line = serde_json::to_string(&KeyReport {
                index,
                path: &path,
                public_key: &public_key,
            })?;
            println!("{}", line);
        } else {
            println!("{:>5}  {:<20}  {}", index, path, public_key);
        }
    }

    tracing::info!(derived = vault.derived_count(), "identities derived");
    Ok(())
}

#[derive(Serialize)]
struct SolveReport {
    block_hash: String,
    tx_id: String,
    difficulty: u32,
    hash_function: HashFunction,
    nonce: u64,
    hash: String,
    elapsed_ms: u64,
}

/// Runs one PoW search on a blocking thread and prints the result as JSON.
async fn solve_once(args: cli::SolveArgs) -> Result<()> {
    let hash_function: HashFunction = args
        .hash_function
        .parse()
        .context("unsupported hash function")?;
    let tx_id = args
        .tx_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let started = Instant::now();
    let (block_hash, tx_id, solution) = tokio::task::spawn_blocking(move || {
        let solution = solve(&args.block_hash, &tx_id, args.difficulty, hash_function);
        (args.block_hash, tx_id, solution)
    })
    .await
    .context("PoW worker panicked")?;
    let solution = solution.context("PoW search failed")?;

    let report = SolveReport {
        block_hash,
        tx_id,
        difficulty: args.difficulty,
        hash_function,
        nonce: solution.nonce,
        hash: hex::encode(solution.hash),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Runs the simulated chain and signs a heartbeat every `heartbeat_ms`
/// until SIGINT or SIGTERM.
async fn run_devnet(args: cli::DevnetArgs) -> Result<()> {
    let vault = Arc::new(
        KeyVault::from_mnemonic(&args.mnemonic.mnemonic).context("cannot open key vault")?,
    );
    let party = vault
        .derive(args.key_index)
        .with_context(|| format!("cannot derive key {}", args.key_index))?
        .public_key_hex();

    let past_blocks: u64 = args
        .past_blocks
        .parse::<f64>()
        .map(|v| v.max(0.0) as u64)
        .with_context(|| format!("invalid --past-blocks '{}'", args.past_blocks))?;

    let chain = Arc::new(DevnetChain::new(
        args.chain_id.clone(),
        Duration::from_millis(args.block_time_ms),
        args.difficulty,
    ));
    let node = Arc::new(DevnetNode::new(Arc::clone(&chain), past_blocks));

    let params = NetworkParameters::new();
    params.set(TX_PER_BLOCK_KEY, args.tx_per_block.clone());
    params.set(NUMBER_OF_PAST_BLOCKS_KEY, args.past_blocks.clone());

    let max_pow_wait = match args.max_pow_wait_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let auth = TransactionAuthenticator::new(
        vault,
        Arc::clone(&chain) as Arc<dyn ChainHeadOracle>,
        Arc::new(params),
        Arc::clone(&node) as Arc<dyn Submitter>,
        InventoryConfig::default(),
        AuthenticatorConfig {
            max_pow_wait,
            ..AuthenticatorConfig::default()
        },
    );
    auth.start();

    tracing::info!(
        chain_id = %args.chain_id,
        block_time_ms = args.block_time_ms,
        difficulty = args.difficulty,
        party = %party,
        "devnet started"
    );

    let mut heartbeat = tokio::time::interval(Duration::from_millis(args.heartbeat_ms.max(1)));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received");
                break;
            }
            _ = heartbeat.tick() => {
                if let Err(e) = send_heartbeat(&auth, &party).await {
                    tracing::warn!(error = %e, "heartbeat failed");
                }
            }
        }
    }

    auth.stop().await;
    let stats = node.stats();
    let inventory = auth.inventory().stats();
    tracing::info!(
        accepted = stats.accepted,
        rejected = stats.rejected,
        pow_unused = inventory.unused,
        "devnet stopped"
    );
    Ok(())
}

/// Signs and submits one cancel-all command.
async fn send_heartbeat(auth: &TransactionAuthenticator, party: &str) -> Result<(), AuthError> {
    let input = InputData::new(Command::OrderCancellation(OrderCancellation::default()));
    let tx = auth.sign(party, input).await?;
    let ack = auth.submit(&tx).await?;
    if ack.success {
        tracing::info!(tx_hash = %ack.tx_hash, tid = %tx.pow.tid, "heartbeat accepted");
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("txauth-node {}", env!("CARGO_PKG_VERSION"));
    println!("tx version  {}", TX_VERSION);
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// If a handler cannot be installed, that signal is never observed and the
/// failure is logged.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
