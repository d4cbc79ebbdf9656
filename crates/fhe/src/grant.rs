//! Time-boxed user-decryption grants.
//!
//! A grant names an ephemeral public key, the contracts whose handles may be
//! decrypted and a validity window. The wallet signs the grant's typed
//! digest. The digest follows the EIP-712 layout (domain separator, then the
//! struct hash) with sha256 in place of keccak.

use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use fleet_core::Address;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{FheError, Result};
use crate::keys::address_from_verifying_key;

const DOMAIN_TYPE: &str = "EIP712Domain(string name,string version,uint256 chainId)";
const DOMAIN_NAME: &str = "Decryption";
const DOMAIN_VERSION: &str = "1";
const GRANT_TYPE: &str = "UserDecryptRequestVerification(bytes publicKey,address[] contractAddresses,uint256 startTimestamp,uint256 durationDays)";

const SECONDS_PER_DAY: i64 = 86_400;

/// Where a grant sits relative to its validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantStatus {
    NotYetValid,
    Active,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionGrant {
    pub public_key: [u8; 32],
    pub contract_addresses: Vec<Address>,
    /// Unix seconds.
    pub start_timestamp: i64,
    pub duration_days: u32,
}

impl DecryptionGrant {
    pub const DEFAULT_DURATION_DAYS: u32 = 10;
    pub const MAX_DURATION_DAYS: u32 = 365;

    pub fn new(
        public_key: [u8; 32],
        contract_addresses: Vec<Address>,
        start: DateTime<Utc>,
        duration_days: u32,
    ) -> Result<Self> {
        let grant = Self {
            public_key,
            contract_addresses,
            start_timestamp: start.timestamp(),
            duration_days,
        };
        grant.validate()?;
        Ok(grant)
    }

    pub fn validate(&self) -> Result<()> {
        if self.contract_addresses.is_empty() {
            return Err(FheError::InvalidGrant("no contract addresses".to_string()));
        }
        if self.duration_days == 0 || self.duration_days > Self::MAX_DURATION_DAYS {
            return Err(FheError::InvalidGrant(format!(
                "duration must be between 1 and {} days, got {}",
                Self::MAX_DURATION_DAYS,
                self.duration_days
            )));
        }
        self.expires_at()?;
        Ok(())
    }

    pub fn covers(&self, contract: &Address) -> bool {
        self.contract_addresses.contains(contract)
    }

    /// End of the window in Unix seconds; a window past `i64::MAX` is invalid.
    pub fn expires_at(&self) -> Result<i64> {
        i64::from(self.duration_days)
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|seconds| self.start_timestamp.checked_add(seconds))
            .ok_or_else(|| {
                FheError::InvalidGrant(format!(
                    "validity window from {} for {} days is out of range",
                    self.start_timestamp, self.duration_days
                ))
            })
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> Result<GrantStatus> {
        let expires_at = self.expires_at()?;
        let now = now.timestamp();
        let status = if now < self.start_timestamp {
            GrantStatus::NotYetValid
        } else if now >= expires_at {
            GrantStatus::Expired
        } else {
            GrantStatus::Active
        };
        Ok(status)
    }

    /// Remaining validity, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Result<Duration> {
        let left = self.expires_at()?.saturating_sub(now.timestamp()).max(0);
        Ok(Duration::try_seconds(left).unwrap_or(Duration::MAX))
    }

    /// Digest the wallet signs.
    pub fn typed_digest(&self, chain_id: u64) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update([0x19, 0x01]);
        hasher.update(domain_separator(chain_id));
        hasher.update(self.struct_hash());
        hasher.finalize().into()
    }

    /// Checks the wallet signature and returns the signing account.
    pub fn verify_signature(
        &self,
        chain_id: u64,
        signer: &[u8; 32],
        signature: &[u8],
    ) -> Result<Address> {
        let key = VerifyingKey::from_bytes(signer)
            .map_err(|e| FheError::InvalidSignature(e.to_string()))?;
        let bytes: [u8; 64] = signature.try_into().map_err(|_| {
            FheError::InvalidSignature(format!("expected 64 bytes, got {}", signature.len()))
        })?;
        key.verify(&self.typed_digest(chain_id), &Signature::from_bytes(&bytes))
            .map_err(|e| FheError::InvalidSignature(e.to_string()))?;
        Ok(address_from_verifying_key(&key))
    }

    fn struct_hash(&self) -> [u8; 32] {
        let mut addresses = Sha256::new();
        for address in &self.contract_addresses {
            addresses.update(word_from_address(address));
        }

        let mut hasher = Sha256::new();
        hasher.update(Sha256::digest(GRANT_TYPE.as_bytes()));
        hasher.update(Sha256::digest(self.public_key));
        hasher.update(addresses.finalize());
        hasher.update(word_from_u64(self.start_timestamp as u64));
        hasher.update(word_from_u64(u64::from(self.duration_days)));
        hasher.finalize().into()
    }
}

fn domain_separator(chain_id: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(Sha256::digest(DOMAIN_TYPE.as_bytes()));
    hasher.update(Sha256::digest(DOMAIN_NAME.as_bytes()));
    hasher.update(Sha256::digest(DOMAIN_VERSION.as_bytes()));
    hasher.update(word_from_u64(chain_id));
    hasher.finalize().into()
}

fn word_from_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn word_from_address(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};

    use super::*;
    use crate::LOCAL_CHAIN_ID;

    const CONTRACT: Address = Address([0x33; 20]);

    fn grant_at(start: DateTime<Utc>, days: u32) -> DecryptionGrant {
        DecryptionGrant::new([9u8; 32], vec![CONTRACT], start, days).unwrap()
    }

    #[test]
    fn duration_bounds_are_enforced() {
        let now = Utc::now();
        assert!(matches!(
            DecryptionGrant::new([0u8; 32], vec![CONTRACT], now, 0),
            Err(FheError::InvalidGrant(_))
        ));
        assert!(matches!(
            DecryptionGrant::new([0u8; 32], vec![CONTRACT], now, 366),
            Err(FheError::InvalidGrant(_))
        ));
        assert!(matches!(
            DecryptionGrant::new([0u8; 32], vec![], now, 10),
            Err(FheError::InvalidGrant(_))
        ));
    }

    #[test]
    fn window_is_start_inclusive_end_exclusive() {
        let start = Utc::now();
        let grant = grant_at(start, 10);

        assert_eq!(
            grant.status_at(start - Duration::seconds(1)),
            Ok(GrantStatus::NotYetValid)
        );
        assert_eq!(grant.status_at(start), Ok(GrantStatus::Active));
        assert_eq!(
            grant.status_at(start + Duration::days(10) - Duration::seconds(1)),
            Ok(GrantStatus::Active)
        );
        assert_eq!(
            grant.status_at(start + Duration::days(10)),
            Ok(GrantStatus::Expired)
        );
        assert_eq!(grant.remaining(start + Duration::days(11)), Ok(Duration::zero()));
    }

    #[test]
    fn window_past_end_of_time_is_invalid() {
        let grant = DecryptionGrant {
            public_key: [9u8; 32],
            contract_addresses: vec![CONTRACT],
            start_timestamp: i64::MAX - SECONDS_PER_DAY,
            duration_days: 2,
        };

        assert!(matches!(grant.expires_at(), Err(FheError::InvalidGrant(_))));
        assert!(matches!(grant.validate(), Err(FheError::InvalidGrant(_))));
        assert!(matches!(
            grant.status_at(Utc::now()),
            Err(FheError::InvalidGrant(_))
        ));

        let last_day = DecryptionGrant {
            duration_days: 1,
            ..grant
        };
        assert_eq!(last_day.expires_at(), Ok(i64::MAX));
        assert_eq!(last_day.validate(), Ok(()));
    }

    #[test]
    fn digest_binds_every_field() {
        let start = Utc::now();
        let grant = grant_at(start, 10);
        let digest = grant.typed_digest(LOCAL_CHAIN_ID);

        assert_ne!(digest, grant.typed_digest(1));
        assert_ne!(digest, grant_at(start, 11).typed_digest(LOCAL_CHAIN_ID));

        let mut other = grant.clone();
        other.contract_addresses.push(Address([0x44; 20]));
        assert_ne!(digest, other.typed_digest(LOCAL_CHAIN_ID));
    }

    #[test]
    fn signature_recovers_signer_address() {
        let wallet = SigningKey::from_bytes(&[5u8; 32]);
        let grant = grant_at(Utc::now(), 10);
        let signature = wallet.sign(&grant.typed_digest(LOCAL_CHAIN_ID));

        let signer = grant
            .verify_signature(
                LOCAL_CHAIN_ID,
                wallet.verifying_key().as_bytes(),
                &signature.to_bytes(),
            )
            .unwrap();
        assert_eq!(signer, address_from_verifying_key(&wallet.verifying_key()));

        let wrong_chain = grant.verify_signature(
            1,
            wallet.verifying_key().as_bytes(),
            &signature.to_bytes(),
        );
        assert!(matches!(wrong_chain, Err(FheError::InvalidSignature(_))));

        let short = grant.verify_signature(LOCAL_CHAIN_ID, wallet.verifying_key().as_bytes(), &[0u8; 10]);
        assert!(matches!(short, Err(FheError::InvalidSignature(_))));
    }
}
