//! # Key Vault
//!
//! Deterministic key derivation from a recovery phrase.
//!
//! The vault turns a BIP-39 mnemonic (empty passphrase) into a seed once, at
//! construction, and then derives ed25519 key pairs along
//! `m/1789'/0'/{index}'` on demand. Every derived pair is cached for the
//! lifetime of the vault.
//!
//! ## Cache layout
//!
//! - An arena (`Vec<Option<Arc<KeyPair>>>`) indexed by derivation index.
//!   Indices are expected to be small and dense (one per configured market)
//!   and are capped at [`MAX_DERIVATION_INDEX`].
//! - A side index from lowercase public-key hex to derivation index.
//!
//! Public-key lookup only sees keys that were already derived. Callers must
//! derive every identity they intend to sign for before signing.
//!
//! ## Concurrency
//!
//! Reads take a shared lock. Derivation is serialised by a dedicated mutex
//! and re-checks the cache after acquiring it, so racing callers for the same
//! index derive exactly once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bip39::Mnemonic;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

use super::slip10::{derive_for_path, DerivationError};
use crate::config::{derivation_path, MAX_DERIVATION_INDEX};
use crate::crypto::keys::KeyPair;

/// Errors raised by the vault.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No recovery phrase was supplied. This is a configuration error and
    /// the process cannot sign anything without it.
    #[error("recovery phrase is empty")]
    EmptyMnemonic,

    /// The recovery phrase is not a valid BIP-39 mnemonic.
    #[error("invalid recovery phrase: {0}")]
    InvalidMnemonic(String),

    /// The index does not fit the arena. See [`MAX_DERIVATION_INDEX`].
    #[error("derivation index {index} exceeds the maximum of {max}")]
    IndexTooLarge { index: u32, max: u32 },

    /// Derivation failed for one index. The index stays underived.
    #[error("cannot derive key {index}: {source}")]
    DerivationFailure {
        index: u32,
        #[source]
        source: DerivationError,
    },
}

#[derive(Default)]
struct DerivedKeys {
    slots: Vec<Option<Arc<KeyPair>>>,
    by_public_key: HashMap<String, u32>,
}

/// Derives and caches the key pairs of one recovery phrase.
pub struct KeyVault {
    seed: [u8; 64],
    keys: RwLock<DerivedKeys>,
    derive_lock: Mutex<()>,
    derivations: AtomicU64,
}

impl KeyVault {
    /// Builds a vault from a BIP-39 recovery phrase.
    ///
    /// The phrase is normalised (NFKD) before hashing. An empty or
    /// whitespace-only phrase yields [`VaultError::EmptyMnemonic`].
    pub fn from_mnemonic(phrase: &str) -> Result<Self, VaultError> {
        if phrase.trim().is_empty() {
            return Err(VaultError::EmptyMnemonic);
        }
        let mnemonic = Mnemonic::parse_normalized(phrase.trim())
            .map_err(|e| VaultError::InvalidMnemonic(e.to_string()))?;
        Ok(Self::from_seed(mnemonic.to_seed("")))
    }

    /// Builds a vault directly from a 64-byte BIP-39 seed.
    pub fn from_seed(seed: [u8; 64]) -> Self {
        Self {
            seed,
            keys: RwLock::new(DerivedKeys::default()),
            derive_lock: Mutex::new(()),
            derivations: AtomicU64::new(0),
        }
    }

    /// Returns the key pair at `index`, deriving it on first use.
    pub fn derive(&self, index: u32) -> Result<Arc<KeyPair>, VaultError> {
        if let Some(kp) = self.cached(index) {
            return Ok(kp);
        }
        if index > MAX_DERIVATION_INDEX {
            return Err(VaultError::IndexTooLarge {
                index,
                max: MAX_DERIVATION_INDEX,
            });
        }

        let _guard = self.derive_lock.lock();
        if let Some(kp) = self.cached(index) {
            return Ok(kp);
        }

        let path = derivation_path(index);
        let node = derive_for_path(&path, &self.seed).map_err(|source| {
            warn!(index, error = %source, "key derivation failed");
            VaultError::DerivationFailure { index, source }
        })?;
        let kp = Arc::new(KeyPair::from_seed(&node.key));
        self.derivations.fetch_add(1, Ordering::Relaxed);

        let mut keys = self.keys.write();
        let slot = index as usize;
        if keys.slots.len() <= slot {
            keys.slots.resize(slot + 1, None);
        }
        keys.slots[slot] = Some(Arc::clone(&kp));
        keys.by_public_key.insert(kp.public_key_hex(), index);
        drop(keys);

        debug!(index, public_key = %kp.public_key_hex(), "derived key");
        Ok(kp)
    }

    /// Finds an already-derived key pair by its public key (any case).
    ///
    /// Never derives speculatively: a key that was not derived yet is not
    /// found.
    pub fn lookup_by_public_key(&self, public_key_hex: &str) -> Option<Arc<KeyPair>> {
        let needle = public_key_hex.to_lowercase();
        let keys = self.keys.read();
        let index = *keys.by_public_key.get(&needle)?;
        keys.slots.get(index as usize).and_then(Clone::clone)
    }

    /// Number of distinct indices derived so far.
    pub fn derived_count(&self) -> usize {
        self.keys.read().by_public_key.len()
    }

    /// Number of derivations actually computed (cache hits excluded).
    pub fn derivations(&self) -> u64 {
        self.derivations.load(Ordering::Relaxed)
    }

    /// Public keys of every derived index, ordered by index.
    pub fn public_keys(&self) -> Vec<(u32, String)> {
        let keys = self.keys.read();
        keys.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|kp| (i as u32, kp.public_key_hex())))
            .collect()
    }

    fn cached(&self, index: u32) -> Option<Arc<KeyPair>> {
        self.keys
            .read()
            .slots
            .get(index as usize)
            .and_then(Clone::clone)
    }
}

impl std::fmt::Debug for KeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVault")
            .field("derived", &self.derived_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon \
                          abandon abandon abandon abandon abandon about";

    #[test]
    fn empty_phrase_is_rejected() {
        assert!(matches!(
            KeyVault::from_mnemonic(""),
            Err(VaultError::EmptyMnemonic)
        ));
        assert!(matches!(
            KeyVault::from_mnemonic("   "),
            Err(VaultError::EmptyMnemonic)
        ));
    }

    #[test]
    fn invalid_phrase_is_rejected() {
        assert!(matches!(
            KeyVault::from_mnemonic("definitely not a mnemonic"),
            Err(VaultError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn derive_is_deterministic_and_cached() {
        let vault = KeyVault::from_mnemonic(PHRASE).unwrap();
        let first = vault.derive(3).unwrap();
        assert_eq!(vault.derivations(), 1);

        let second = vault.derive(3).unwrap();
        assert_eq!(vault.derivations(), 1, "second call must hit the cache");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.private_key_hex(), second.private_key_hex());

        // A fresh vault over the same phrase yields the same bits.
        let other = KeyVault::from_mnemonic(PHRASE).unwrap();
        assert_eq!(other.derive(3).unwrap().public_key_hex(), first.public_key_hex());
    }

    #[test]
    fn derive_matches_slip10_path() {
        let vault = KeyVault::from_seed([9u8; 64]);
        let node = derive_for_path("m/1789'/0'/2'", &[9u8; 64]).unwrap();
        assert_eq!(
            vault.derive(2).unwrap().private_key_hex(),
            hex::encode(node.key)
        );
    }

    #[test]
    fn index_above_arena_limit_is_rejected() {
        let vault = KeyVault::from_seed([1u8; 64]);
        let err = vault.derive(u32::MAX).unwrap_err();
        assert!(matches!(
            err,
            VaultError::IndexTooLarge { index: u32::MAX, .. }
        ));
        assert_eq!(vault.derived_count(), 0);
        assert_eq!(vault.derivations(), 0);
    }

    #[test]
    fn lookup_only_sees_derived_keys() {
        let vault = KeyVault::from_seed([4u8; 64]);
        let probe = KeyVault::from_seed([4u8; 64]);
        let future_key = probe.derive(5).unwrap().public_key_hex();

        assert!(vault.lookup_by_public_key(&future_key).is_none());
        vault.derive(5).unwrap();
        assert!(vault.lookup_by_public_key(&future_key).is_some());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let vault = KeyVault::from_seed([4u8; 64]);
        let kp = vault.derive(0).unwrap();
        let found = vault
            .lookup_by_public_key(&kp.public_key_hex().to_uppercase())
            .unwrap();
        assert_eq!(found.public_key_hex(), kp.public_key_hex());
    }

    #[test]
    fn public_keys_are_ordered_by_index() {
        let vault = KeyVault::from_seed([2u8; 64]);
        vault.derive(4).unwrap();
        vault.derive(1).unwrap();
        let indices: Vec<u32> = vault.public_keys().into_iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![1, 4]);
        assert_eq!(vault.derived_count(), 2);
    }

    #[test]
    fn concurrent_derivation_of_one_index_runs_once() {
        let vault = Arc::new(KeyVault::from_seed([8u8; 64]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let v = Arc::clone(&vault);
                std::thread::spawn(move || v.derive(7).unwrap().public_key_hex())
            })
            .collect();
        let keys: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(keys.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(vault.derivations(), 1);
    }
}
