//! # Hashing Utilities
//!
//! SHA3-256 is the only hash the authenticator needs: it digests the signing
//! bytes before ed25519 signs them, and it is the PoW hash function the
//! network calls `sha3_24_rounds` (standard Keccak-f with 24 rounds).

use sha3::{Digest, Sha3_256};

/// Computes the SHA3-256 digest of `data`.
///
/// ```
/// use txauth_protocol::crypto::sha3_256;
///
/// let digest = sha3_256(b"");
/// assert_eq!(
///     hex::encode(digest),
///     "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
/// );
/// ```
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Counts the leading zero bits of `bytes`, most significant bit first.
pub fn leading_zero_bits(bytes: &[u8]) -> u32 {
    let mut zeros = 0;
    for byte in bytes {
        if *byte == 0 {
            zeros += 8;
        } else {
            zeros += byte.leading_zeros();
            break;
        }
    }
    zeros
}
