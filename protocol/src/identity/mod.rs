//! # Identity Module
//!
//! Deterministic signing identities. One recovery phrase yields every key
//! the process signs with:
//!
//! 1. **BIP-39** turns the phrase into a 64-byte seed (empty passphrase).
//! 2. **SLIP-10** derives an ed25519 seed per index along
//!    `m/1789'/0'/{index}'`.
//! 3. **Vault** caches the resulting key pairs and resolves them by public
//!    key, which is how parties are named on the wire.

pub mod slip10;
pub mod vault;

pub use slip10::{derive_for_path, parse_path, DerivationError, ExtendedKey};
pub use vault::{KeyVault, VaultError};
