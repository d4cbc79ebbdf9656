//! Key material used by the decryption handshake.

use ed25519_dalek::{SigningKey, VerifyingKey};
use fleet_core::Address;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Throwaway keypair generated per decryption request.
///
/// The public half is embedded in the grant so the service knows which key
/// the result is addressed to.
#[derive(Clone)]
pub struct EphemeralKeypair {
    signing_key: SigningKey,
}

impl EphemeralKeypair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn private_key(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key())
    }
}

impl std::fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeypair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Derives an account address from a wallet's verifying key.
///
/// Last 20 bytes of `sha256(public_key)`.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let digest = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::new(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_stable_for_a_key() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let a = address_from_verifying_key(&key.verifying_key());
        let b = address_from_verifying_key(&key.verifying_key());
        assert_eq!(a, b);
        assert!(!a.is_zero());
    }

    #[test]
    fn ephemeral_keypairs_differ() {
        let a = EphemeralKeypair::generate();
        let b = EphemeralKeypair::generate();
        assert_ne!(a.public_key(), b.public_key());
        assert_eq!(a.public_key_hex().len(), 64);
    }
}
