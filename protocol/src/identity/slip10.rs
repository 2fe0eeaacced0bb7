//! # SLIP-10 Derivation (ed25519)
//!
//! Hierarchical derivation of ed25519 seeds from a BIP-39 seed, following
//! SLIP-0010. The ed25519 curve only supports hardened children, so every
//! path segment must carry the `'` (or `h`) marker.
//!
//! ```text
//! master:  I = HMAC-SHA512(key = "ed25519 seed", data = seed)
//! child:   I = HMAC-SHA512(key = chain_code, data = 0x00 || key || ser32(i + 2^31))
//!          key = I[0..32], chain_code = I[32..64]
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha512;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

/// HMAC key for the master node on the ed25519 curve.
const ED25519_CURVE_KEY: &[u8] = b"ed25519 seed";

/// Offset added to hardened child indices.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Errors raised while parsing paths or deriving nodes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DerivationError {
    #[error("derivation path must start with 'm': {0}")]
    MissingRoot(String),

    #[error("invalid path segment '{0}'")]
    InvalidSegment(String),

    #[error("ed25519 only supports hardened derivation, got segment '{0}'")]
    NonHardenedSegment(String),

    #[error("child index {0} exceeds the hardened range")]
    IndexOutOfRange(u32),
}

/// A node in the derivation tree: a 32-byte key and its chain code.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    pub key: [u8; 32],
    pub chain_code: [u8; 32],
}

impl ExtendedKey {
    /// Derives the master node from a BIP-39 seed.
    pub fn master(seed: &[u8]) -> Self {
        Self::from_hmac(ED25519_CURVE_KEY, seed)
    }

    /// Derives the hardened child `index` (without the offset applied).
    pub fn derive_hardened(&self, index: u32) -> Result<Self, DerivationError> {
        if index >= HARDENED_OFFSET {
            return Err(DerivationError::IndexOutOfRange(index));
        }
        let mut data = Vec::with_capacity(1 + 32 + 4);
        data.push(0x00);
        data.extend_from_slice(&self.key);
        data.extend_from_slice(&(index + HARDENED_OFFSET).to_be_bytes());
        Ok(Self::from_hmac(&self.chain_code, &data))
    }

    fn from_hmac(key: &[u8], data: &[u8]) -> Self {
        // HMAC accepts keys of any length, so this cannot fail.
        let mut mac = match HmacSha512::new_from_slice(key) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC-SHA512 accepts keys of any length"),
        };
        mac.update(data);
        let out = mac.finalize().into_bytes();

        let mut node = Self {
            key: [0u8; 32],
            chain_code: [0u8; 32],
        };
        node.key.copy_from_slice(&out[..32]);
        node.chain_code.copy_from_slice(&out[32..]);
        node
    }
}

impl std::fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ExtendedKey(..)")
    }
}

/// Parses a path like `m/1789'/0'/3'` into child indices (offset not
/// applied). Every segment must be hardened.
pub fn parse_path(path: &str) -> Result<Vec<u32>, DerivationError> {
    let mut segments = path.trim().split('/');
    match segments.next() {
        Some("m") => {}
        _ => return Err(DerivationError::MissingRoot(path.to_string())),
    }

    segments
        .map(|segment| {
            let digits = segment
                .strip_suffix('\'')
                .or_else(|| segment.strip_suffix('h'))
                .ok_or_else(|| DerivationError::NonHardenedSegment(segment.to_string()))?;
            let index: u32 = digits
                .parse()
                .map_err(|_| DerivationError::InvalidSegment(segment.to_string()))?;
            if index >= HARDENED_OFFSET {
                return Err(DerivationError::IndexOutOfRange(index));
            }
            Ok(index)
        })
        .collect()
}

/// Derives the node at `path` from a BIP-39 seed.
pub fn derive_for_path(path: &str, seed: &[u8]) -> Result<ExtendedKey, DerivationError> {
    parse_path(path)?
        .into_iter()
        .try_fold(ExtendedKey::master(seed), |node, index| node.derive_hardened(index))
}
