//! Canonical signing bytes and the ed25519 signature over them.
//!
//! ```text
//! signing_bytes = chain_id || 0x00 || bincode(InputData)
//! digest        = SHA3-256(signing_bytes)
//! signature     = Ed25519(seed, digest)
//! ```
//!
//! The chain id prefix binds a signature to one network; the same payload
//! signed for two chains yields two unrelated signatures.

use ed25519_dalek::Signature;

use super::types::InputData;
use crate::config::CHAIN_ID_DELIMITER;
use crate::crypto::hash::sha3_256;
use crate::crypto::keys::KeyPair;

/// Serializes the payload canonically.
pub fn encode_input_data(input: &InputData) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(input)
}

/// Builds `chain_id || 0x00 || input_data`.
pub fn signing_bytes(chain_id: &str, input_data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(chain_id.len() + 1 + input_data.len());
    out.extend_from_slice(chain_id.as_bytes());
    out.push(CHAIN_ID_DELIMITER);
    out.extend_from_slice(input_data);
    out
}

/// SHA3-256 of the signing bytes. This is what gets signed.
pub fn signing_digest(chain_id: &str, input_data: &[u8]) -> [u8; 32] {
    sha3_256(&signing_bytes(chain_id, input_data))
}

/// Signs already-serialized input data for `chain_id`.
pub fn sign_input_data(keypair: &KeyPair, chain_id: &str, input_data: &[u8]) -> Signature {
    keypair.sign(&signing_digest(chain_id, input_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::types::{Command, OrderCancellation};

    fn payload() -> Vec<u8> {
        let mut input = InputData::new(Command::OrderCancellation(OrderCancellation::default()));
        input.nonce = 12;
        input.block_height = 400;
        encode_input_data(&input).unwrap()
    }

    #[test]
    fn signing_bytes_layout() {
        assert_eq!(signing_bytes("abc", &[1, 2]), vec![b'a', b'b', b'c', 0, 1, 2]);
        assert_eq!(signing_bytes("", &[]), vec![0]);
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(payload(), payload());
    }

    #[test]
    fn signature_verifies_over_digest() {
        let kp = KeyPair::from_seed(&[3u8; 32]);
        let data = payload();
        let sig = sign_input_data(&kp, "mainnet", &data);
        assert!(kp.verify(&signing_digest("mainnet", &data), &sig));
        assert!(!kp.verify(&signing_bytes("mainnet", &data), &sig));
    }

    #[test]
    fn signature_is_bound_to_chain_id() {
        let kp = KeyPair::from_seed(&[3u8; 32]);
        let data = payload();
        let sig = sign_input_data(&kp, "mainnet", &data);
        assert!(!kp.verify(&signing_digest("testnet", &data), &sig));
    }

    #[test]
    fn expanded_private_key_signs_like_its_seed() {
        let kp = KeyPair::from_seed(&[5u8; 32]);
        let expanded = format!("{}{}", kp.private_key_hex(), kp.public_key_hex());
        let reloaded = KeyPair::from_private_key_hex(&expanded).unwrap();
        let data = payload();
        assert_eq!(
            sign_input_data(&kp, "c", &data),
            sign_input_data(&reloaded, "c", &data)
        );
    }
}
