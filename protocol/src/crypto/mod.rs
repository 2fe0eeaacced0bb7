//! # Cryptographic Primitives
//!
//! Thin wrappers over audited implementations:
//!
//! - **Ed25519** (`ed25519-dalek`) for transaction signatures.
//! - **SHA3-256** (`sha3`) for the signing digest and the PoW hash.
//!
//! Key derivation (BIP-39 + SLIP-10) lives in [`crate::identity`] because it
//! is about *which* key to use, not how to use one.

pub mod hash;
pub mod keys;

pub use hash::{leading_zero_bits, sha3_256};
pub use keys::{verify_hex, KeyError, KeyPair};
