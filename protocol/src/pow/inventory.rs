//! # PoW Inventory
//!
//! Height-bucketed pool of precomputed spam-PoW solutions.
//!
//! ## Refill
//!
//! Each refill tick reads the chain head and, if the bucket for that height
//! has never been filled, computes a batch of candidates in parallel. The
//! candidate at batch position `i` gets difficulty
//!
//! ```text
//! base_difficulty + floor((i + 1) / numberOfTxPerBlock)
//! ```
//!
//! which mirrors the network's per-block spam cost curve: every
//! `numberOfTxPerBlock` transactions from one key in one block cost one more
//! leading zero. The searches run on blocking threads outside the lock and
//! the finished batch is inserted in one step.
//!
//! ## Expiry
//!
//! Each expiry tick drops every bucket at or below
//! `head.height - round(0.8 * numberOfPastBlocks)`, used or not.
//!
//! ## Acquisition
//!
//! [`ProofOfWorkInventory::acquire`] returns the unused candidate with the
//! lowest height, then the lowest difficulty, and flags it as used in the
//! same critical section. Two callers can never receive the same candidate.
//!
//! ## Thread Safety
//!
//! All bucket state sits behind one `parking_lot::Mutex`. Expiry and
//! acquisition both need a consistent view across buckets, so there is no
//! per-bucket locking. The lock is never held across an `.await`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chain::{read_f64, ChainHead, ChainHeadOracle, ParameterError, ParameterSource};
use crate::config::{InventoryConfig, NUMBER_OF_PAST_BLOCKS_KEY, TX_PER_BLOCK_KEY};

use super::scheduler::SchedulerHandle;
use super::solver::solve;
use super::PowError;

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A precomputed PoW solution for one block height.
///
/// `(block_height, tx_id)` is unique for the lifetime of the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowCandidate {
    pub block_hash: String,
    pub block_height: u64,
    pub difficulty: u32,
    pub nonce: u64,
    pub tx_id: String,
    pub used: bool,
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Difficulty of the candidate at batch position `position` (0-based).
///
/// Saturates at `u32::MAX`; the solver rejects anything above 256.
pub fn difficulty_for_position(base: u32, position: usize, tx_per_block: f64) -> u32 {
    let extra = ((position + 1) as f64 / tx_per_block).floor();
    base.saturating_add(extra as u32)
}

/// Highest height that is no longer worth keeping.
///
/// Buckets at or below the returned height are dropped. Saturates at zero
/// when the window is larger than the chain.
pub fn retain_floor(head_height: u64, number_of_past_blocks: f64, retention_factor: f64) -> u64 {
    let window = (retention_factor * number_of_past_blocks).round();
    head_height.saturating_sub(window as u64)
}

/// Computes `batch_size` candidates for `head` in parallel.
///
/// Each candidate gets a fresh UUID v4 as its transaction id. Every search
/// runs on the blocking pool; the call returns once all of them finished.
/// If any search fails, the whole batch is discarded.
pub async fn compute_batch(
    head: &ChainHead,
    tx_per_block: f64,
    batch_size: usize,
) -> Result<Vec<PowCandidate>, PowError> {
    let workers = (0..batch_size).map(|position| {
        let difficulty = difficulty_for_position(head.spam_pow_difficulty, position, tx_per_block);
        let block_hash = head.hash.clone();
        let block_height = head.height;
        let hash_function = head.hash_function;

        tokio::task::spawn_blocking(move || -> Result<PowCandidate, PowError> {
            let tx_id = Uuid::new_v4().to_string();
            let solution = solve(&block_hash, &tx_id, difficulty, hash_function)?;
            Ok(PowCandidate {
                block_hash,
                block_height,
                difficulty,
                nonce: solution.nonce,
                tx_id,
                used: false,
            })
        })
    });

    join_all(workers)
        .await
        .into_iter()
        .map(|joined| {
            joined
                .map_err(|e| PowError::Worker(e.to_string()))
                .and_then(|result| result)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tick outcomes
// ---------------------------------------------------------------------------

/// What a refill tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefillOutcome {
    /// The oracle had no chain head. Retried on the next tick.
    OracleUnavailable,

    /// The bucket for this height already exists.
    AlreadyFilled { height: u64 },

    /// Another refill is computing this height right now.
    InProgress { height: u64 },

    /// `numberOfTxPerBlock` was missing or malformed.
    ParameterUnavailable(ParameterError),

    /// The PoW search failed; nothing was inserted.
    Failed(PowError),

    /// A new batch was inserted.
    Filled { height: u64, count: usize },
}

/// What an expiry tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpireOutcome {
    OracleUnavailable,
    ParameterUnavailable(ParameterError),
    Expired { retain_floor: u64, dropped: usize },
}

/// Point-in-time counts, for health reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    pub buckets: usize,
    pub candidates: usize,
    pub unused: usize,
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Default)]
struct InventoryState {
    buckets: BTreeMap<u64, Vec<PowCandidate>>,
    /// Heights whose batch is being computed.
    filling: BTreeSet<u64>,
}

/// Removes a height from the filling set when the refill that claimed it
/// ends, including when its future is dropped mid-search.
struct FillingClaim<'a> {
    state: &'a Mutex<InventoryState>,
    height: u64,
}

impl Drop for FillingClaim<'_> {
    fn drop(&mut self) {
        self.state.lock().filling.remove(&self.height);
    }
}

/// Pool of precomputed PoW candidates, refilled and expired on timers.
pub struct ProofOfWorkInventory {
    oracle: Arc<dyn ChainHeadOracle>,
    params: Arc<dyn ParameterSource>,
    config: InventoryConfig,
    state: Mutex<InventoryState>,
    available: Notify,
    scheduler: Mutex<Option<SchedulerHandle>>,
}

impl ProofOfWorkInventory {
    pub fn new(
        oracle: Arc<dyn ChainHeadOracle>,
        params: Arc<dyn ParameterSource>,
        config: InventoryConfig,
    ) -> Self {
        Self {
            oracle,
            params,
            config,
            state: Mutex::new(InventoryState::default()),
            available: Notify::new(),
            scheduler: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// One refill step. Runs every `refill_interval` under the scheduler.
    pub async fn refill_tick(&self) -> RefillOutcome {
        let head = match self.oracle.chain_head().await {
            Ok(head) => head,
            Err(e) => {
                debug!(error = %e, "skipping PoW refill: no chain head");
                return RefillOutcome::OracleUnavailable;
            }
        };
        let height = head.height;

        if let Some(outcome) = self.fill_state(height) {
            return outcome;
        }

        let tx_per_block = match read_f64(self.params.as_ref(), TX_PER_BLOCK_KEY) {
            Ok(v) if v > 0.0 => v,
            Ok(v) => {
                let err = ParameterError::Unparsable {
                    key: TX_PER_BLOCK_KEY.to_string(),
                    value: v.to_string(),
                };
                warn!(error = %err, "skipping PoW refill");
                return RefillOutcome::ParameterUnavailable(err);
            }
            Err(err) => {
                warn!(error = %err, "skipping PoW refill");
                return RefillOutcome::ParameterUnavailable(err);
            }
        };

        let _claim = {
            let mut state = self.state.lock();
            if let Some(outcome) = Self::fill_state_locked(&state, height) {
                return outcome;
            }
            state.filling.insert(height);
            FillingClaim {
                state: &self.state,
                height,
            }
        };

        let started = Instant::now();
        let batch = match compute_batch(&head, tx_per_block, self.config.batch_size).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(height, error = %e, "PoW batch computation failed");
                return RefillOutcome::Failed(e);
            }
        };

        let count = batch.len();
        if !self.insert_batch(height, batch) {
            return RefillOutcome::AlreadyFilled { height };
        }
        debug!(
            height,
            count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "computed PoW batch"
        );
        RefillOutcome::Filled { height, count }
    }

    /// One expiry step. Runs every `expire_interval` under the scheduler.
    pub async fn expire_tick(&self) -> ExpireOutcome {
        let head = match self.oracle.chain_head().await {
            Ok(head) => head,
            Err(e) => {
                debug!(error = %e, "skipping PoW expiry: no chain head");
                return ExpireOutcome::OracleUnavailable;
            }
        };

        let past_blocks = match read_f64(self.params.as_ref(), NUMBER_OF_PAST_BLOCKS_KEY) {
            Ok(v) if v >= 0.0 => v,
            Ok(v) => {
                let err = ParameterError::Unparsable {
                    key: NUMBER_OF_PAST_BLOCKS_KEY.to_string(),
                    value: v.to_string(),
                };
                warn!(error = %err, "skipping PoW expiry");
                return ExpireOutcome::ParameterUnavailable(err);
            }
            Err(err) => {
                warn!(error = %err, "skipping PoW expiry");
                return ExpireOutcome::ParameterUnavailable(err);
            }
        };

        let floor = retain_floor(head.height, past_blocks, self.config.retention_factor);
        let dropped = self.expire_through(floor);
        if dropped > 0 {
            debug!(retain_floor = floor, dropped, "expired PoW buckets");
        }
        ExpireOutcome::Expired {
            retain_floor: floor,
            dropped,
        }
    }

    /// Inserts a finished batch for `height`.
    ///
    /// Returns `false` and drops the batch if the bucket already holds
    /// candidates; buckets are never appended to. Wakes waiters on success.
    pub fn insert_batch(&self, height: u64, batch: Vec<PowCandidate>) -> bool {
        if batch.is_empty() {
            return false;
        }
        {
            let mut state = self.state.lock();
            let bucket = state.buckets.entry(height).or_default();
            if !bucket.is_empty() {
                return false;
            }
            *bucket = batch;
        }
        self.available.notify_waiters();
        true
    }

    /// Drops every bucket at or below `floor`. Returns how many were dropped.
    pub fn expire_through(&self, floor: u64) -> usize {
        let mut state = self.state.lock();
        let before = state.buckets.len();
        // split_off keeps keys >= floor + 1 in the returned map.
        let retained = match floor.checked_add(1) {
            Some(first_kept) => state.buckets.split_off(&first_kept),
            None => BTreeMap::new(),
        };
        state.buckets = retained;
        before - state.buckets.len()
    }

    /// Claims the best unused candidate: lowest height, then lowest
    /// difficulty. The candidate is flagged as used and stays in its bucket.
    pub fn acquire(&self) -> Option<PowCandidate> {
        let mut state = self.state.lock();
        let (height, position) = state.buckets.iter().find_map(|(height, bucket)| {
            bucket
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.used)
                .min_by_key(|(_, c)| c.difficulty)
                .map(|(position, _)| (*height, position))
        })?;

        let candidate = state.buckets.get_mut(&height)?.get_mut(position)?;
        candidate.used = true;
        Some(candidate.clone())
    }

    /// True if any bucket holds an unused candidate.
    pub fn has_unused(&self) -> bool {
        self.state
            .lock()
            .buckets
            .values()
            .any(|bucket| bucket.iter().any(|c| !c.used))
    }

    /// Waits until a candidate can be acquired, then acquires it.
    ///
    /// Wakes on every batch insertion and at least every `poll_interval`.
    /// The inventory lock is only taken for each acquisition attempt, never
    /// while waiting. Dropping the future cancels the wait.
    pub async fn wait_for_candidate(&self, poll_interval: Duration) -> PowCandidate {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(candidate) = self.acquire() {
                return candidate;
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    /// Current bucket and candidate counts.
    pub fn stats(&self) -> InventoryStats {
        let state = self.state.lock();
        let mut stats = InventoryStats {
            buckets: state.buckets.len(),
            ..InventoryStats::default()
        };
        for bucket in state.buckets.values() {
            stats.candidates += bucket.len();
            stats.unused += bucket.iter().filter(|c| !c.used).count();
        }
        stats
    }

    /// Snapshot of one bucket, used candidates included.
    pub fn bucket(&self, height: u64) -> Vec<PowCandidate> {
        self.state
            .lock()
            .buckets
            .get(&height)
            .cloned()
            .unwrap_or_default()
    }

    /// Heights currently holding a bucket, ascending.
    pub fn heights(&self) -> Vec<u64> {
        self.state.lock().buckets.keys().copied().collect()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Starts the refill and expiry tasks. Returns `false` if they are
    /// already running. Requires a tokio runtime.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut slot = self.scheduler.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(SchedulerHandle::spawn(Arc::downgrade(self), &self.config));
        info!(
            refill_ms = self.config.refill_interval.as_millis() as u64,
            expire_ms = self.config.expire_interval.as_millis() as u64,
            "PoW inventory scheduler started"
        );
        true
    }

    /// Stops the maintenance tasks and waits for them to exit.
    pub async fn stop(&self) {
        let handle = self.scheduler.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
            info!("PoW inventory scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.lock().is_some()
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn fill_state(&self, height: u64) -> Option<RefillOutcome> {
        Self::fill_state_locked(&self.state.lock(), height)
    }

    fn fill_state_locked(state: &InventoryState, height: u64) -> Option<RefillOutcome> {
        if state
            .buckets
            .get(&height)
            .is_some_and(|bucket| !bucket.is_empty())
        {
            return Some(RefillOutcome::AlreadyFilled { height });
        }
        if state.filling.contains(&height) {
            return Some(RefillOutcome::InProgress { height });
        }
        None
    }
}

impl std::fmt::Debug for ProofOfWorkInventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofOfWorkInventory")
            .field("stats", &self.stats())
            .field("config", &self.config)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{HashFunction, NetworkParameters, OracleError};
    use crate::pow::verify_pow;
    use async_trait::async_trait;

    const HASH: &str = "A1B2C3D4E5F60718293A4B5C6D7E8F90A1B2C3D4E5F60718293A4B5C6D7E8F90";

    struct TestOracle {
        head: Mutex<Option<ChainHead>>,
    }

    impl TestOracle {
        fn at(height: u64, difficulty: u32) -> Arc<Self> {
            Arc::new(Self {
                head: Mutex::new(Some(head(height, difficulty))),
            })
        }

        fn offline() -> Arc<Self> {
            Arc::new(Self {
                head: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl ChainHeadOracle for TestOracle {
        async fn chain_head(&self) -> Result<ChainHead, OracleError> {
            self.head
                .lock()
                .clone()
                .ok_or_else(|| OracleError::Unavailable("offline".into()))
        }
    }

    fn head(height: u64, difficulty: u32) -> ChainHead {
        ChainHead {
            height,
            hash: HASH.to_string(),
            spam_pow_difficulty: difficulty,
            hash_function: HashFunction::Sha3_24Rounds,
            chain_id: "testnet".into(),
        }
    }

    fn params(tx_per_block: &str, past_blocks: &str) -> Arc<NetworkParameters> {
        Arc::new(
            [
                (TX_PER_BLOCK_KEY, tx_per_block),
                (NUMBER_OF_PAST_BLOCKS_KEY, past_blocks),
            ]
            .into_iter()
            .collect(),
        )
    }

    fn inventory(oracle: Arc<TestOracle>, params: Arc<NetworkParameters>) -> ProofOfWorkInventory {
        ProofOfWorkInventory::new(oracle, params, InventoryConfig::default())
    }

    fn offline_inventory() -> ProofOfWorkInventory {
        inventory(TestOracle::offline(), params("2", "10"))
    }

    fn candidate(height: u64, difficulty: u32, tx_id: &str) -> PowCandidate {
        PowCandidate {
            block_hash: HASH.into(),
            block_height: height,
            difficulty,
            nonce: 0,
            tx_id: tx_id.into(),
            used: false,
        }
    }

    // -- Policy ---------------------------------------------------------------

    #[test]
    fn difficulty_curve_for_two_tx_per_block() {
        let curve: Vec<u32> = (0..10).map(|i| difficulty_for_position(5, i, 2.0)).collect();
        assert_eq!(curve, vec![5, 6, 6, 7, 7, 8, 8, 9, 9, 10]);
    }

    #[test]
    fn difficulty_is_non_decreasing_in_position() {
        for tx_per_block in [0.5, 1.0, 2.0, 3.0, 7.5, 100.0] {
            let curve: Vec<u32> = (0..10)
                .map(|i| difficulty_for_position(4, i, tx_per_block))
                .collect();
            assert!(
                curve.windows(2).all(|w| w[0] <= w[1]),
                "curve {:?} for tx_per_block {}",
                curve,
                tx_per_block
            );
        }
    }

    #[test]
    fn difficulty_saturates_instead_of_wrapping() {
        assert_eq!(difficulty_for_position(u32::MAX, 9, 1.0), u32::MAX);
    }

    #[test]
    fn retain_floor_scenario() {
        assert_eq!(retain_floor(1000, 10.0, 0.8), 992);
        assert_eq!(retain_floor(5, 100.0, 0.8), 0);
        // round(0.8 * 3) = round(2.4) = 2
        assert_eq!(retain_floor(50, 3.0, 0.8), 48);
    }

    // -- Acquisition ----------------------------------------------------------

    #[test]
    fn acquire_prefers_lowest_height_over_difficulty() {
        let inv = offline_inventory();
        inv.insert_batch(101, vec![candidate(101, 3, "b")]);
        inv.insert_batch(100, vec![candidate(100, 7, "a")]);

        let first = inv.acquire().unwrap();
        assert_eq!((first.block_height, first.difficulty), (100, 7));
        let second = inv.acquire().unwrap();
        assert_eq!((second.block_height, second.difficulty), (101, 3));
        assert!(inv.acquire().is_none());
    }

    #[test]
    fn acquire_breaks_ties_by_lowest_difficulty() {
        let inv = offline_inventory();
        inv.insert_batch(
            100,
            vec![candidate(100, 9, "x"), candidate(100, 5, "y"), candidate(100, 7, "z")],
        );
        let order: Vec<u32> = std::iter::from_fn(|| inv.acquire()).map(|c| c.difficulty).collect();
        assert_eq!(order, vec![5, 7, 9]);
    }

    #[test]
    fn acquired_candidates_stay_in_their_bucket() {
        let inv = offline_inventory();
        inv.insert_batch(100, vec![candidate(100, 5, "a"), candidate(100, 6, "b")]);
        let taken = inv.acquire().unwrap();
        assert!(taken.used);

        let bucket = inv.bucket(100);
        assert_eq!(bucket.len(), 2);
        assert!(bucket.iter().any(|c| c.tx_id == taken.tx_id && c.used));
        assert_eq!(
            inv.stats(),
            InventoryStats {
                buckets: 1,
                candidates: 2,
                unused: 1
            }
        );
    }

    #[test]
    fn has_unused_tracks_consumption() {
        let inv = offline_inventory();
        assert!(!inv.has_unused());
        inv.insert_batch(100, vec![candidate(100, 5, "a")]);
        assert!(inv.has_unused());
        inv.acquire().unwrap();
        assert!(!inv.has_unused());
    }

    #[test]
    fn concurrent_acquirers_never_share_a_candidate() {
        let inv = Arc::new(offline_inventory());
        for height in 0..4u64 {
            let batch = (0..25)
                .map(|i| candidate(height, i % 5, &format!("{}-{}", height, i)))
                .collect();
            inv.insert_batch(height, batch);
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let inv = Arc::clone(&inv);
                std::thread::spawn(move || {
                    std::iter::from_fn(|| inv.acquire())
                        .map(|c| (c.block_height, c.tx_id))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<(u64, String)> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(total, 100);
        assert_eq!(all.len(), 100, "a candidate was handed out twice");
    }

    // -- Insertion & expiry ---------------------------------------------------

    #[test]
    fn a_filled_bucket_is_never_appended_to() {
        let inv = offline_inventory();
        assert!(inv.insert_batch(100, vec![candidate(100, 5, "a")]));
        assert!(!inv.insert_batch(100, vec![candidate(100, 5, "b")]));
        inv.acquire().unwrap();
        // Depleted but present still counts as filled.
        assert!(!inv.insert_batch(100, vec![candidate(100, 5, "c")]));
        assert_eq!(inv.bucket(100).len(), 1);
        assert!(!inv.insert_batch(101, Vec::new()));
    }

    #[test]
    fn expire_through_drops_floor_and_below_regardless_of_use() {
        let inv = offline_inventory();
        for height in [990, 991, 992, 993, 994] {
            inv.insert_batch(height, vec![candidate(height, 5, "t")]);
        }
        // Consume the 990 candidate and leave the others unused.
        inv.acquire().unwrap();

        assert_eq!(inv.expire_through(992), 3);
        assert_eq!(inv.heights(), vec![993, 994]);
        assert_eq!(inv.expire_through(u64::MAX), 2);
        assert!(inv.heights().is_empty());
    }

    // -- Ticks ----------------------------------------------------------------

    #[tokio::test]
    async fn refill_fills_once_per_height_with_escalating_difficulty() {
        let oracle = TestOracle::at(100, 5);
        let inv = inventory(oracle, params("2", "10"));

        let outcome = inv.refill_tick().await;
        assert_eq!(outcome, RefillOutcome::Filled { height: 100, count: 10 });

        let mut difficulties: Vec<u32> = inv.bucket(100).iter().map(|c| c.difficulty).collect();
        difficulties.sort_unstable();
        assert_eq!(difficulties, vec![5, 6, 6, 7, 7, 8, 8, 9, 9, 10]);

        for c in inv.bucket(100) {
            assert!(!c.used);
            assert!(verify_pow(HASH, &c.tx_id, c.nonce, c.difficulty, HashFunction::Sha3_24Rounds).unwrap());
        }

        assert_eq!(
            inv.refill_tick().await,
            RefillOutcome::AlreadyFilled { height: 100 }
        );
        assert_eq!(inv.bucket(100).len(), 10);
    }

    #[tokio::test]
    async fn refill_gives_every_candidate_a_unique_tx_id() {
        let inv = inventory(TestOracle::at(7, 1), params("1", "10"));
        inv.refill_tick().await;
        let mut ids: Vec<String> = inv.bucket(7).into_iter().map(|c| c.tx_id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[tokio::test]
    async fn refill_skips_without_oracle_or_parameter() {
        let inv = offline_inventory();
        assert_eq!(inv.refill_tick().await, RefillOutcome::OracleUnavailable);

        let no_param = inventory(TestOracle::at(100, 1), Arc::new(NetworkParameters::new()));
        assert!(matches!(
            no_param.refill_tick().await,
            RefillOutcome::ParameterUnavailable(ParameterError::Absent(_))
        ));

        let garbage = inventory(TestOracle::at(100, 1), params("lots", "10"));
        assert!(matches!(
            garbage.refill_tick().await,
            RefillOutcome::ParameterUnavailable(ParameterError::Unparsable { .. })
        ));

        let zero = inventory(TestOracle::at(100, 1), params("0", "10"));
        assert!(matches!(
            zero.refill_tick().await,
            RefillOutcome::ParameterUnavailable(ParameterError::Unparsable { .. })
        ));
        assert_eq!(zero.stats(), InventoryStats::default());
    }

    #[tokio::test]
    async fn refill_with_unsolvable_difficulty_inserts_nothing() {
        let inv = inventory(TestOracle::at(100, 300), params("1", "10"));
        assert!(matches!(
            inv.refill_tick().await,
            RefillOutcome::Failed(PowError::DifficultyTooHigh(_))
        ));
        assert!(inv.heights().is_empty());
    }

    #[tokio::test]
    async fn expire_tick_uses_head_and_parameter() {
        let oracle = TestOracle::at(1000, 1);
        let inv = inventory(Arc::clone(&oracle), params("2", "10"));
        for height in [991, 992, 993, 1000] {
            inv.insert_batch(height, vec![candidate(height, 1, "t")]);
        }

        assert_eq!(
            inv.expire_tick().await,
            ExpireOutcome::Expired {
                retain_floor: 992,
                dropped: 2
            }
        );
        assert_eq!(inv.heights(), vec![993, 1000]);

        *oracle.head.lock() = None;
        assert_eq!(inv.expire_tick().await, ExpireOutcome::OracleUnavailable);

        let no_param = inventory(TestOracle::at(1000, 1), Arc::new(NetworkParameters::new()));
        assert!(matches!(
            no_param.expire_tick().await,
            ExpireOutcome::ParameterUnavailable(ParameterError::Absent(_))
        ));
    }

    #[tokio::test]
    async fn waiter_wakes_when_a_batch_lands() {
        let inv = Arc::new(offline_inventory());
        let waiter = {
            let inv = Arc::clone(&inv);
            tokio::spawn(async move { inv.wait_for_candidate(Duration::from_secs(3600)).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        inv.insert_batch(42, vec![candidate(42, 1, "late")]);

        let got = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter should wake on insertion")
            .unwrap();
        assert_eq!(got.tx_id, "late");
        assert!(got.used);
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let inv = Arc::new(inventory(TestOracle::at(1, 1), params("1", "10")));
        assert!(inv.start());
        assert!(!inv.start());
        assert!(inv.is_running());
        inv.stop().await;
        assert!(!inv.is_running());
        inv.stop().await;
    }
}
