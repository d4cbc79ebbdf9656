//! Signing accounts.

use ed25519_dalek::{Signer, SigningKey};
use fhe::{DecryptionGrant, address_from_verifying_key};
use fleet_core::Address;
use runtime::{SignedTransaction, Transaction};
use sha2::{Digest, Sha256};

use crate::error::{Result, TransportError};

const DEV_ACCOUNT_DOMAIN: &[u8] = b"fleet.dev-account.v1";

/// An account able to sign transactions and decryption grants.
#[derive(Clone)]
pub struct Wallet {
    key: SigningKey,
    address: Address,
}

impl Wallet {
    pub fn from_signing_key(key: SigningKey) -> Self {
        let address = address_from_verifying_key(&key.verifying_key());
        Self { key, address }
    }

    /// Parses a 32-byte seed given as hex, with or without `0x`.
    pub fn from_hex(secret: &str) -> Result<Self> {
        let secret = secret.trim();
        let mut seed = [0u8; 32];
        hex::decode_to_slice(secret.strip_prefix("0x").unwrap_or(secret), &mut seed)
            .map_err(|e| TransportError::WalletUnavailable(format!("invalid private key: {e}")))?;
        Ok(Self::from_signing_key(SigningKey::from_bytes(&seed)))
    }

    /// Deterministic development account, the local counterpart of a
    /// mnemonic-derived signer list.
    pub fn dev_account(index: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(DEV_ACCOUNT_DOMAIN);
        hasher.update(index.to_be_bytes());
        let seed: [u8; 32] = hasher.finalize().into();
        Self::from_signing_key(SigningKey::from_bytes(&seed))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    pub fn sign_transaction(&self, transaction: Transaction, chain_id: u64) -> SignedTransaction {
        transaction.sign(&self.key, chain_id)
    }

    /// Signs the grant's typed digest.
    pub fn sign_grant(&self, grant: &DecryptionGrant, chain_id: u64) -> Vec<u8> {
        self.key
            .sign(&grant.typed_digest(chain_id))
            .to_bytes()
            .to_vec()
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use fhe::{EphemeralKeypair, LOCAL_CHAIN_ID};

    use super::*;

    #[test]
    fn dev_accounts_are_stable_and_distinct() {
        assert_eq!(Wallet::dev_account(0).address(), Wallet::dev_account(0).address());
        assert_ne!(Wallet::dev_account(0).address(), Wallet::dev_account(1).address());
    }

    #[test]
    fn hex_seed_accepts_prefix() {
        let secret = hex::encode([7u8; 32]);
        let plain = Wallet::from_hex(&secret).unwrap();
        let prefixed = Wallet::from_hex(&format!("0x{secret}")).unwrap();
        assert_eq!(plain.address(), prefixed.address());
    }

    #[test]
    fn malformed_seed_is_rejected() {
        assert!(matches!(
            Wallet::from_hex("0x1234"),
            Err(TransportError::WalletUnavailable(_))
        ));
    }

    #[test]
    fn grant_signature_recovers_wallet_address() {
        let wallet = Wallet::dev_account(3);
        let grant = DecryptionGrant::new(
            EphemeralKeypair::generate().public_key(),
            vec![Address([0x01; 20])],
            Utc::now(),
            DecryptionGrant::DEFAULT_DURATION_DAYS,
        )
        .unwrap();

        let signature = wallet.sign_grant(&grant, LOCAL_CHAIN_ID);
        let signer = grant
            .verify_signature(LOCAL_CHAIN_ID, &wallet.public_key(), &signature)
            .unwrap();
        assert_eq!(signer, wallet.address());
    }

    #[test]
    fn debug_hides_key() {
        let rendered = format!("{:?}", Wallet::dev_account(0));
        assert!(rendered.contains("address"));
        assert!(!rendered.contains("key"));
    }
}
