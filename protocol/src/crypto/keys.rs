//! # Key Material
//!
//! Ed25519 key pairs as the authenticator stores and uses them.
//!
//! A [`KeyPair`] holds the 32-byte ed25519 seed (what the network calls the
//! private key) and the matching 32-byte public key. Both are available as
//! lowercase hex, which is the representation parties are identified by on
//! the wire.
//!
//! ## Private-key truncation
//!
//! Some wallets export the 64-byte expanded form (`seed || public_key`).
//! [`KeyPair::from_private_key_hex`] accepts any hex string that decodes to
//! at least 32 bytes and uses only the first 32 as the seed. Anything shorter
//! is rejected with [`KeyError::InvalidSecretKey`].
//!
//! Key bytes are never logged. `Debug` prints the public key only.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while decoding keys or checking signatures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key: expected at least 32 bytes of hex")]
    InvalidSecretKey,

    #[error("invalid public key: not 32 bytes of hex or not a curve point")]
    InvalidPublicKey,

    #[error("invalid signature encoding: expected 64 bytes of hex")]
    InvalidSignature,

    #[error("signature verification failed")]
    VerificationFailed,
}

/// An ed25519 key pair derived by the vault or loaded from hex.
pub struct KeyPair {
    signing_key: SigningKey,
    public_key: [u8; 32],
}

impl KeyPair {
    /// Builds a key pair from a 32-byte ed25519 seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let public_key = signing_key.verifying_key().to_bytes();
        Self {
            signing_key,
            public_key,
        }
    }

    /// Builds a key pair from a hex-encoded private key.
    ///
    /// Only the first 32 decoded bytes are used as the seed; longer inputs
    /// (such as the 64-byte `seed || public_key` form) are truncated.
    pub fn from_private_key_hex(private_key_hex: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(private_key_hex).map_err(|_| KeyError::InvalidSecretKey)?;
        if bytes.len() < SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidSecretKey);
        }
        let mut seed = [0u8; SECRET_KEY_LENGTH];
        seed.copy_from_slice(&bytes[..SECRET_KEY_LENGTH]);
        Ok(Self::from_seed(&seed))
    }

    /// Raw public key bytes.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.public_key
    }

    /// Lowercase hex of the public key. This is the party identifier.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }

    /// Lowercase hex of the 32-byte seed.
    ///
    /// Handle with care: this is the whole secret.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Signs `message` with pure Ed25519.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Checks a signature made by this key pair.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.signing_key
            .verifying_key()
            .verify(message, signature)
            .is_ok()
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
    }
}

impl Eq for KeyPair {}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair(pub={})", self.public_key_hex())
    }
}

/// Verifies a hex-encoded signature against a hex-encoded public key.
///
/// Public key hex is accepted in either case.
pub fn verify_hex(public_key_hex: &str, message: &[u8], signature_hex: &str) -> Result<(), KeyError> {
    let pk_bytes = hex::decode(public_key_hex).map_err(|_| KeyError::InvalidPublicKey)?;
    let pk_arr: [u8; 32] = pk_bytes
        .as_slice()
        .try_into()
        .map_err(|_| KeyError::InvalidPublicKey)?;
    let verifying_key = VerifyingKey::from_bytes(&pk_arr).map_err(|_| KeyError::InvalidPublicKey)?;

    let sig_bytes = hex::decode(signature_hex).map_err(|_| KeyError::InvalidSignature)?;
    let sig_arr: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| KeyError::InvalidSignature)?;
    let signature = Signature::from_bytes(&sig_arr);

    verifying_key
        .verify(message, &signature)
        .map_err(|_| KeyError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: [u8; 32] = [7u8; 32];

    #[test]
    fn from_seed_is_deterministic() {
        let a = KeyPair::from_seed(&SEED);
        let b = KeyPair::from_seed(&SEED);
        assert_eq!(a.public_key_hex(), b.public_key_hex());
        assert_eq!(a.private_key_hex(), hex::encode(SEED));
    }

    #[test]
    fn hex_is_lowercase_and_sized() {
        let kp = KeyPair::from_seed(&SEED);
        let pk = kp.public_key_hex();
        assert_eq!(pk.len(), 64);
        assert_eq!(pk, pk.to_lowercase());
    }

    #[test]
    fn sign_verify_roundtrip() {
        let kp = KeyPair::from_seed(&SEED);
        let sig = kp.sign(b"submit order");
        assert!(kp.verify(b"submit order", &sig));
        assert!(!kp.verify(b"cancel order", &sig));
    }

    #[test]
    fn private_key_hex_longer_than_32_bytes_is_truncated() {
        let kp = KeyPair::from_seed(&SEED);
        // 64-byte expanded form: seed || public key.
        let expanded = format!("{}{}", kp.private_key_hex(), kp.public_key_hex());
        let restored = KeyPair::from_private_key_hex(&expanded).unwrap();
        assert_eq!(restored, kp);

        let msg = b"same seed, same signature";
        assert_eq!(restored.sign(msg), kp.sign(msg));
    }

    #[test]
    fn short_or_malformed_private_key_is_rejected() {
        assert_eq!(
            KeyPair::from_private_key_hex("deadbeef").unwrap_err(),
            KeyError::InvalidSecretKey
        );
        assert_eq!(
            KeyPair::from_private_key_hex("zz").unwrap_err(),
            KeyError::InvalidSecretKey
        );
    }

    #[test]
    fn verify_hex_accepts_uppercase_public_key() {
        let kp = KeyPair::from_seed(&SEED);
        let sig = hex::encode(kp.sign(b"msg").to_bytes());
        verify_hex(&kp.public_key_hex().to_uppercase(), b"msg", &sig).unwrap();
    }

    #[test]
    fn verify_hex_reports_each_failure() {
        let kp = KeyPair::from_seed(&SEED);
        let sig = hex::encode(kp.sign(b"msg").to_bytes());

        assert_eq!(
            verify_hex("abcd", b"msg", &sig).unwrap_err(),
            KeyError::InvalidPublicKey
        );
        assert_eq!(
            verify_hex(&kp.public_key_hex(), b"msg", "abcd").unwrap_err(),
            KeyError::InvalidSignature
        );
        assert_eq!(
            verify_hex(&kp.public_key_hex(), b"other", &sig).unwrap_err(),
            KeyError::VerificationFailed
        );
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = KeyPair::from_seed(&SEED);
        let dbg = format!("{:?}", kp);
        assert!(dbg.starts_with("KeyPair(pub="));
        assert!(!dbg.contains(&kp.private_key_hex()));
    }
}
