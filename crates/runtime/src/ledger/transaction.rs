//! Signed transactions and their receipts.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use fhe::address_from_verifying_key;
use fleet_core::{ActionOutput, Address, FleetAction, FleetEvent, TransitionPhase};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::LedgerError;

const TX_DOMAIN: &[u8] = b"fleet.ledger.tx.v1";

/// 32-byte transaction hash, rendered as `0x` hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl FromStr for TxHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for TxHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            text.parse().map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Self)
        }
    }
}

/// What a transaction does once included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxPayload {
    /// Creates a new registry instance.
    Deploy { contract_name: String },
    /// Calls a state-changing method of a deployed registry.
    Call { to: Address, action: FleetAction },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Address,
    pub payload: TxPayload,
    /// Random value that keeps otherwise identical transactions distinct.
    pub salt: u64,
}

impl Transaction {
    pub fn deploy(from: Address, contract_name: impl Into<String>) -> Self {
        Self {
            from,
            payload: TxPayload::Deploy {
                contract_name: contract_name.into(),
            },
            salt: rand::random(),
        }
    }

    pub fn call(from: Address, to: Address, action: impl Into<FleetAction>) -> Self {
        Self {
            from,
            payload: TxPayload::Call {
                to,
                action: action.into(),
            },
            salt: rand::random(),
        }
    }

    pub fn to(&self) -> Option<Address> {
        match &self.payload {
            TxPayload::Deploy { .. } => None,
            TxPayload::Call { to, .. } => Some(*to),
        }
    }

    /// Name of the invoked method, or `deploy`.
    pub fn method(&self) -> &str {
        match &self.payload {
            TxPayload::Deploy { .. } => "deploy",
            TxPayload::Call { action, .. } => action.name(),
        }
    }

    /// Hash over the chain id and every field of the transaction.
    pub fn hash(&self, chain_id: u64) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update(TX_DOMAIN);
        hasher.update(chain_id.to_be_bytes());
        hasher.update(self.from.as_bytes());
        hasher.update(self.salt.to_be_bytes());

        match &self.payload {
            TxPayload::Deploy { contract_name } => {
                hasher.update([0u8]);
                hasher.update((contract_name.len() as u64).to_be_bytes());
                hasher.update(contract_name.as_bytes());
            }
            TxPayload::Call { to, action } => {
                hasher.update([1u8]);
                hasher.update(to.as_bytes());
                match action {
                    FleetAction::MintShip(_) => hasher.update([0u8]),
                    FleetAction::LaunchAttack(attack) => {
                        hasher.update([1u8]);
                        hasher.update(attack.token_id.0.to_be_bytes());
                        hasher.update(attack.defense.as_bytes());
                        let proof = attack.input_proof.as_bytes();
                        hasher.update((proof.len() as u64).to_be_bytes());
                        hasher.update(proof);
                    }
                }
            }
        }

        TxHash(hasher.finalize().into())
    }

    pub fn sign(self, key: &SigningKey, chain_id: u64) -> SignedTransaction {
        let hash = self.hash(chain_id);
        let signature = key.sign(&hash.0);
        SignedTransaction {
            transaction: self,
            public_key: key.verifying_key().to_bytes(),
            signature: signature.to_bytes().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub public_key: [u8; 32],
    pub signature: Vec<u8>,
}

impl SignedTransaction {
    pub fn hash(&self, chain_id: u64) -> TxHash {
        self.transaction.hash(chain_id)
    }

    /// Checks the signature and that the key belongs to `from`.
    pub fn verify(&self, chain_id: u64) -> Result<TxHash, LedgerError> {
        let key = VerifyingKey::from_bytes(&self.public_key)
            .map_err(|e| LedgerError::InvalidSignature(e.to_string()))?;
        let bytes: [u8; 64] = self.signature.as_slice().try_into().map_err(|_| {
            LedgerError::InvalidSignature(format!(
                "expected 64 bytes, got {}",
                self.signature.len()
            ))
        })?;

        let hash = self.hash(chain_id);
        key.verify(&hash.0, &Signature::from_bytes(&bytes))
            .map_err(|e| LedgerError::InvalidSignature(e.to_string()))?;

        let signer = address_from_verifying_key(&key);
        if signer != self.transaction.from {
            return Err(LedgerError::SenderMismatch {
                from: self.transaction.from,
                signer,
            });
        }

        Ok(hash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Success,
    Reverted,
}

impl TxStatus {
    /// `1` for success, `0` for a revert.
    pub fn code(self) -> u8 {
        match self {
            TxStatus::Success => 1,
            TxStatus::Reverted => 0,
        }
    }
}

/// Why a registry call reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertReason {
    /// Custom-error name, e.g. `AlreadyMinted`.
    pub code: String,
    pub message: String,
    pub phase: TransitionPhase,
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub from: Address,
    pub to: Option<Address>,
    /// Set for successful deployments.
    pub contract_address: Option<Address>,
    pub status: TxStatus,
    pub output: Option<ActionOutput>,
    pub revert_reason: Option<RevertReason>,
    pub events: Vec<FleetEvent>,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}
