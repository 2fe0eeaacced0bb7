//! # Inventory Maintenance Tasks
//!
//! Two independent periodic tasks keep the inventory current:
//!
//! - **refill** runs [`ProofOfWorkInventory::refill_tick`] every
//!   `refill_interval`. A tick that is still computing when the next one is
//!   due delays it rather than overlapping it.
//! - **expire** runs [`ProofOfWorkInventory::expire_tick`] every
//!   `expire_interval`.
//!
//! ## Shutdown
//!
//! Both tasks watch a `tokio::sync::watch` channel. When the handle sends
//! `true` (or is dropped) each task exits at its next await point. A refill
//! interrupted mid-search inserts nothing and releases its height claim.
//!
//! The tasks hold a `Weak` reference, so they also exit once the last
//! strong reference to the inventory is gone.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::InventoryConfig;

use super::inventory::{ProofOfWorkInventory, RefillOutcome};

/// Running refill and expiry tasks of one inventory.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    refill: JoinHandle<()>,
    expire: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Spawns both tasks on the current tokio runtime.
    pub fn spawn(inventory: Weak<ProofOfWorkInventory>, config: &InventoryConfig) -> Self {
        let (shutdown, rx) = watch::channel(false);

        let refill = tokio::spawn(refill_loop(
            Weak::clone(&inventory),
            config.refill_interval,
            rx.clone(),
        ));
        let expire = tokio::spawn(expire_loop(inventory, config.expire_interval, rx));

        Self {
            shutdown,
            refill,
            expire,
        }
    }

    /// Signals both tasks and waits for them to exit.
    pub async fn stop(self) {
        // Receivers may already be gone if both tasks exited on their own.
        let _ = self.shutdown.send(true);
        for (name, task) in [("refill", self.refill), ("expire", self.expire)] {
            if let Err(e) = task.await {
                warn!(task = name, error = %e, "inventory task ended abnormally");
            }
        }
    }
}

async fn refill_loop(
    inventory: Weak<ProofOfWorkInventory>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }
        let Some(inventory) = inventory.upgrade() else {
            break;
        };

        tokio::select! {
            outcome = inventory.refill_tick() => {
                if let RefillOutcome::Filled { height, count } = outcome {
                    debug!(height, count, "refill tick inserted a batch");
                }
            }
            _ = shutdown.changed() => break,
        }
    }
    debug!("refill task stopped");
}

async fn expire_loop(
    inventory: Weak<ProofOfWorkInventory>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }
        let Some(inventory) = inventory.upgrade() else {
            break;
        };

        tokio::select! {
            _ = inventory.expire_tick() => {}
            _ = shutdown.changed() => break,
        }
    }
    debug!("expire task stopped");
}
